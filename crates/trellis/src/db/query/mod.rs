//! Query modules.
//!
//! Raw parameter state lives on `ElementQuery`; normalization,
//! expansion, and plan evaluation happen per execution call.

mod compile;
mod execute;
mod explain;
mod intent;

pub mod order;
pub mod paginate;
pub mod param;
pub mod predicate;
pub mod related;

pub use execute::{ElementIter, Response, ResponseError};
pub use explain::{
    ExplainAccessPath, ExplainAncestors, ExplainDescendants, ExplainOrderBy, ExplainPagination,
    ExplainPlan, ExplainRelation, ExplainStructure,
};
pub use intent::{ElementQuery, QueryError};
pub use order::{OrderBy, OrderDirection, OrderSpec, normalize_order_by};
pub use paginate::{Page, Paginator};
pub use param::{ParamOperator, QueryParam};
pub use predicate::{CompareOp, ComparePredicate, Predicate};
pub use related::{
    CriterionGroup, CriterionLeaf, RelatedToCriterion, RelatedToError, RelatedToInput,
    RelationOperator, ScopedCriterion, SiteRef, normalize_related_to,
};

#[cfg(test)]
mod tests;
