use std::fmt;
use thiserror::Error as ThisError;

///
/// EngineError
///
/// Structured runtime error with a stable classification. Parameter and
/// shape errors are local and recoverable (fix the input, recompile);
/// storage errors surface unchanged for the caller's own retry policy.
///

#[derive(Debug, ThisError)]
#[error("{message}")]
pub struct EngineError {
    pub class: ErrorClass,
    pub origin: ErrorOrigin,
    pub message: String,
}

impl EngineError {
    pub fn new(class: ErrorClass, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            class,
            origin,
            message: message.into(),
        }
    }
}

///
/// ErrorClass
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorClass {
    /// A parameter failed shape or value validation.
    InvalidParams,

    /// A parameter combination is intentionally refused.
    Unsupported,

    /// Two query inputs claim the same logical column.
    Conflict,

    /// A required row was not found.
    NotFound,

    /// Stored rows violate an engine invariant.
    Corruption,

    /// The backing store failed.
    Storage,

    /// Engine bug.
    Internal,
}

///
/// ErrorOrigin
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorOrigin {
    Param,
    Relation,
    Structure,
    Condition,
    Query,
    Store,
    Response,
}

impl fmt::Display for ErrorOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Param => "param",
            Self::Relation => "relation",
            Self::Structure => "structure",
            Self::Condition => "condition",
            Self::Query => "query",
            Self::Store => "store",
            Self::Response => "response",
        };

        write!(f, "{name}")
    }
}
