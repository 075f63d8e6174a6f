pub mod element;
pub mod relation;
pub mod structure;

pub use element::ElementStore;
pub use relation::{RelationEdge, RelationStore};
pub use structure::{StructureNode, StructureStore};

use crate::{
    error::{EngineError, ErrorClass, ErrorOrigin},
    types::ElementId,
};
use thiserror::Error as ThisError;

///
/// StoreError
///

#[derive(Debug, ThisError)]
pub enum StoreError {
    #[error("element {id} missing during hydration")]
    MissingRow { id: ElementId },
}

impl StoreError {
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::MissingRow { .. } => ErrorClass::Corruption,
        }
    }
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        Self::new(err.class(), ErrorOrigin::Store, err.to_string())
    }
}
