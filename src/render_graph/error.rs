//! Render graph configuration errors

use crate::backend::traits::BackendError;
use thiserror::Error;

/// Fatal configuration errors, raised before any frame executes
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("Pass '{0}' is already registered")]
    DuplicatePassId(String),
    #[error("Dependency cycle between passes {passes:?}")]
    CyclicDependency { passes: Vec<String> },
    #[error("Resource '{resource}' is written by both '{first}' and '{second}'")]
    MultipleProducers {
        resource: String,
        first: String,
        second: String,
    },
    #[error("Resource '{resource}' is imported but also written by '{pass}'")]
    ImportedResourceProduced { resource: String, pass: String },
    #[error("Pass '{pass}' must run after unknown pass '{referenced}'")]
    UnknownPassReference { pass: String, referenced: String },
    #[error("Temporal resource needs at least 2 generations, got {0}")]
    InvalidHistoryLength(usize),
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),
}

pub type GraphResult<T> = Result<T, GraphError>;
