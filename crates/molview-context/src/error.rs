//! Error types for context resolution and rendering

use thiserror::Error;

use crate::context::Scope;

/// Errors from resolving or configuring a render context
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ContextError {
    /// A deferred field has no counterpart on the context it defers to
    #[error("Context has no field named '{0}'")]
    MissingField(String),

    /// The field a deferred value points at is itself deferred
    #[error("Field '{0}' is deferred in the context it resolves against")]
    UnresolvedField(String),

    #[error("Type mismatch for field '{field}': expected {expected}, got {actual}")]
    TypeMismatch {
        field: String,
        expected: &'static str,
        actual: &'static str,
    },

    /// Only global contexts may be installed in the ambient slot
    #[error("Expected a {expected} context, got a {actual} one")]
    ScopeMismatch { expected: Scope, actual: Scope },

    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    /// A configuration document could not be read
    #[error("Invalid render configuration: {0}")]
    Config(String),
}

impl From<serde_json::Error> for ContextError {
    fn from(err: serde_json::Error) -> Self {
        ContextError::Config(err.to_string())
    }
}

/// Result type for context operations
pub type ContextResult<T> = Result<T, ContextError>;

/// Errors from the render pipeline
#[derive(Debug, Error)]
pub enum RenderError {
    #[error(transparent)]
    Context(#[from] ContextError),

    #[error("Rasterization failed: {0}")]
    Rasterize(String),
}
