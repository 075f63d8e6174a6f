//! Trellis core: the element relation & structure query engine. Param
//! normalization, relation criteria, nested-set structure filters,
//! condition rules, and the query compiler/executor over the content
//! stores.

pub mod db;
pub mod error;
pub mod obs;
pub mod types;
pub mod value;

// test
#[cfg(test)]
pub(crate) mod test_fixtures;

///
/// Prelude
///
/// Prelude contains only domain vocabulary.
/// No errors, executors, stores, or helpers are re-exported here.
///

pub mod prelude {
    pub use crate::{
        db::{
            Db,
            context::{DbConfig, QueryContext},
            element::{Element, ElementStatus},
            query::{ElementQuery, Paginator},
        },
        types::{ElementId, FieldId, SiteId, StructureId, Timestamp},
        value::Value,
    };
}
