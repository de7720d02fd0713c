use crate::store::StoreError;
use serde::Serialize;

/// Result alias for engine operations
pub type WbsResult<T> = Result<T, WbsError>;

/// Coarse error classification an outer layer can map to a transport status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    NotFound,
    Validation,
    Conflict,
    Persistence,
}

/// Engine errors
#[derive(Debug, thiserror::Error)]
pub enum WbsError {
    /// A referenced task, parent, prerequisite, edge or project does not exist
    #[error("{entity} '{id}' not found")]
    NotFound { entity: &'static str, id: String },

    /// Malformed input, including self-referential or cycle-forming dependencies
    #[error("invalid {field}: {message}")]
    Validation { field: String, message: String },

    /// The request is well-formed but the current state forbids it
    #[error("conflict: {0}")]
    Conflict(String),

    /// Opaque failure from the task store
    #[error("persistence error: {0}")]
    Persistence(#[from] StoreError),
}

impl WbsError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        WbsError::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        WbsError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        WbsError::Conflict(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            WbsError::NotFound { .. } => ErrorKind::NotFound,
            WbsError::Validation { .. } => ErrorKind::Validation,
            WbsError::Conflict(_) => ErrorKind::Conflict,
            WbsError::Persistence(_) => ErrorKind::Persistence,
        }
    }
}
