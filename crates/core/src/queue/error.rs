use thiserror::Error;

/// Errors that can occur while talking to the message queue.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueueError {
    #[error("Queue connection failed: {0}")]
    ConnectionFailed(String),
    #[error("Queue operation failed: {0}")]
    OperationFailed(String),
    #[error("Unknown receipt: {0}")]
    UnknownReceipt(String),
    #[error("Malformed payload: {0}")]
    Malformed(String),
}

/// Result type for queue operations.
pub type Result<T> = std::result::Result<T, QueueError>;
