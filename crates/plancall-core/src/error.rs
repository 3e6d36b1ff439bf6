//! Error types for plancall definitions.

use thiserror::Error;

/// Main error type for building problems and plans.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// A problem definition is invalid.
    #[error("Problem definition invalid: {message}")]
    ProblemInvalid { message: String },

    /// Two entities of the same kind share a name.
    #[error("Duplicate {kind} name: {name}")]
    DuplicateName { kind: String, name: String },

    /// An action was instantiated with the wrong number of parameters.
    #[error("Action {action} expects {expected} parameters, got {actual}")]
    ArityMismatch {
        action: String,
        expected: usize,
        actual: usize,
    },

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// Convenience Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::SerializationError(err.to_string())
    }
}
