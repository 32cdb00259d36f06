use thiserror::Error;

use crate::cache::CacheError;

/// Errors raised by the idempotency ledger.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdempotencyError {
    /// Another request holding the same key has not finished yet.
    #[error("Request with idempotency key '{0}' is still in progress")]
    InProgress(String),
    #[error(transparent)]
    Cache(#[from] CacheError),
}

/// Result type for idempotency operations.
pub type Result<T> = std::result::Result<T, IdempotencyError>;
