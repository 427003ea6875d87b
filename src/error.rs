//! Error taxonomy for the service layer.

use thiserror::Error;
use validator::ValidationError;

/// Errors that can occur in service layer operations.
///
/// Intent failures are reported back to the issuing socket as an `error`
/// message carrying [`ServiceError::to_string`]; nothing here panics.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Unauthorized access attempt (not the host, not the judge).
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Invalid input provided by the client.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Operation cannot be performed in the current state.
    #[error("invalid state: {0}")]
    InvalidState(String),
    /// Requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),
}

impl From<ValidationError> for ServiceError {
    fn from(err: ValidationError) -> Self {
        ServiceError::InvalidInput(err.to_string())
    }
}
