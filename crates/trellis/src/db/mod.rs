pub mod condition;
pub mod context;
pub mod element;
pub mod query;
pub mod store;

pub use context::{DbConfig, QueryContext, ReadConsistency};

use crate::db::{
    condition::FieldRegistry,
    query::ElementQuery,
    store::{ElementStore, RelationStore, StructureStore},
};

///
/// Db
///
/// A handle to the content stores and field registry one engine
/// instance reads. The `Db` is the entry point for querying; rows and
/// field definitions are populated by the owning collaborators.
///

#[derive(Debug, Default)]
pub struct Db {
    config: DbConfig,
    elements: ElementStore,
    relations: RelationStore,
    structures: StructureStore,
    fields: FieldRegistry,
}

impl Db {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_config(config: DbConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Start a query with an empty context.
    #[must_use]
    pub fn query(&self) -> ElementQuery<'_> {
        ElementQuery::new(self, QueryContext::default())
    }

    /// Start a query with an explicit context.
    #[must_use]
    pub fn query_with(&self, ctx: QueryContext) -> ElementQuery<'_> {
        ElementQuery::new(self, ctx)
    }

    // ------------------------------------------------------------------
    // Stores
    // ------------------------------------------------------------------

    #[must_use]
    pub const fn config(&self) -> &DbConfig {
        &self.config
    }

    #[must_use]
    pub const fn elements(&self) -> &ElementStore {
        &self.elements
    }

    pub const fn elements_mut(&mut self) -> &mut ElementStore {
        &mut self.elements
    }

    #[must_use]
    pub const fn relations(&self) -> &RelationStore {
        &self.relations
    }

    pub const fn relations_mut(&mut self) -> &mut RelationStore {
        &mut self.relations
    }

    #[must_use]
    pub const fn structures(&self) -> &StructureStore {
        &self.structures
    }

    pub const fn structures_mut(&mut self) -> &mut StructureStore {
        &mut self.structures
    }

    #[must_use]
    pub const fn fields(&self) -> &FieldRegistry {
        &self.fields
    }

    pub const fn fields_mut(&mut self) -> &mut FieldRegistry {
        &mut self.fields
    }
}
