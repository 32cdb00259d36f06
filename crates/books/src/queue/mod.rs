//! Message queue backends.
//!
//! Concrete implementations of `books_core::queue::MessageQueue`. The
//! in-memory queue is always compiled; the `aws` feature adds SQS.

pub mod memory;

#[cfg(feature = "aws")]
pub mod sqs;

pub use memory::MemoryQueue;

#[cfg(feature = "aws")]
pub use sqs::SqsQueue;
