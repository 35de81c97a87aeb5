//! Store error types.

use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Store operation failed: {0}")]
    Operation(String),

    #[error("Store connection failed: {0}")]
    Connection(String),
}

/// Type alias for Result with StoreError.
pub type StoreResult<T> = Result<T, StoreError>;
