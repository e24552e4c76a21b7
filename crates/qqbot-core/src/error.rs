//! Domain-level error types.

use thiserror::Error;

/// Domain errors - invalid input or missing configuration.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Entity not found: {entity_type} `{id}`")]
    NotFound { entity_type: &'static str, id: String },

    #[error("Validation failed: {0}")]
    Validation(String),
}
