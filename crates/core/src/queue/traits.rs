use std::time::Duration;

use async_trait::async_trait;

use super::{QueueMessage, Result};

/// An at-least-once message queue.
#[async_trait]
pub trait MessageQueue: Send + Sync {
    /// Enqueues a serialized payload. Returns the message id.
    async fn enqueue(&self, body: &str) -> Result<String>;

    /// Receives up to `max_messages`, waiting at most `wait` for the first one
    /// to arrive. Returns an empty batch when the wait elapses.
    async fn receive(&self, max_messages: usize, wait: Duration) -> Result<Vec<QueueMessage>>;

    /// Deletes a delivered message so it is never redelivered.
    async fn delete(&self, receipt: &str) -> Result<()>;

    /// Moves a message to the dead-letter sink and removes it from the queue.
    async fn dead_letter(&self, message: &QueueMessage) -> Result<()>;
}
