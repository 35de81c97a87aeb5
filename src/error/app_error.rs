use thiserror::Error;

use crate::store::StoreError;

/// Application-wide error type that represents all possible errors in the system.
///
/// Maps the relay's failure taxonomy: client input problems surface as 4xx,
/// store and gateway failures as 5xx, and everything unexpected as Internal.
/// Duplicate suppression is deliberately NOT an error anywhere in this crate.
#[derive(Error, Debug)]
pub enum AppError {
    /// Validation error with field-specific details
    #[error("Validation failed for {field}: {reason}")]
    Validation { field: String, reason: String },

    /// Bad request error with descriptive message
    #[error("Bad request: {message}")]
    BadRequest { message: String },

    /// Unauthorized access error (missing or incorrect API key)
    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    /// Resource not found error with entity, field, and value information
    #[error("Resource not found: {entity} with {field}={value}")]
    NotFound {
        entity: String,
        field: String,
        value: String,
    },

    /// Shared store (dedup keys, queue, rules) failure
    #[error("Store operation failed")]
    Store(#[from] StoreError),

    /// SMS gateway transport failure or rejection
    #[error("Gateway error: {message}")]
    Gateway { message: String },

    /// Upstream webhook transport failure
    #[error("Webhook error: {message}")]
    Webhook { message: String },

    /// Internal error for unexpected failures
    #[error("Internal error")]
    Internal {
        #[source]
        source: anyhow::Error,
    },
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        AppError::Internal { source: error }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        AppError::Internal {
            source: anyhow::Error::from(error),
        }
    }
}

/// Type alias for Result with AppError to simplify function signatures
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_validation_details() {
        let err = AppError::Validation {
            field: "phone_numbers".to_string(),
            reason: "must not be empty".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Validation failed for phone_numbers: must not be empty"
        );
    }

    #[test]
    fn converts_store_error() {
        let err: AppError = StoreError::Operation("boom".to_string()).into();
        assert!(matches!(err, AppError::Store(_)));
    }
}
