//! In-memory at-least-once queue.
//!
//! Mirrors the SQS behaviour the ingestion pipeline depends on: a received
//! message is hidden for the visibility timeout and comes back with a higher
//! receive count unless it is deleted first. Each delivery gets a fresh
//! receipt and only the latest receipt can delete the message.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};
use uuid::Uuid;

use books_core::queue::{MessageQueue, QueueError, QueueMessage, Result};

/// Default visibility timeout, matching SQS.
pub const DEFAULT_VISIBILITY_TIMEOUT: Duration = Duration::from_secs(30);

/// Upper bound on how long `receive` sleeps between visibility checks.
const POLL_STEP: Duration = Duration::from_millis(25);

#[derive(Debug, Clone)]
struct StoredMessage {
    message_id: String,
    body: String,
    receive_count: u32,
    visible_at: Instant,
    receipt: Option<String>,
}

#[derive(Debug, Default)]
struct QueueState {
    messages: VecDeque<StoredMessage>,
    dead_letters: Vec<QueueMessage>,
}

/// In-memory queue with visibility timeout, receive counts and a
/// dead-letter list.
#[derive(Debug, Clone)]
pub struct MemoryQueue {
    state: Arc<Mutex<QueueState>>,
    arrivals: Arc<Notify>,
    visibility_timeout: Duration,
}

impl Default for MemoryQueue {
    fn default() -> Self {
        Self::new(DEFAULT_VISIBILITY_TIMEOUT)
    }
}

impl MemoryQueue {
    pub fn new(visibility_timeout: Duration) -> Self {
        Self {
            state: Arc::new(Mutex::new(QueueState::default())),
            arrivals: Arc::new(Notify::new()),
            visibility_timeout,
        }
    }

    /// Messages still on the queue, visible or in flight.
    pub async fn len(&self) -> usize {
        self.state.lock().await.messages.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Messages moved to the dead-letter list, oldest first.
    pub async fn dead_letters(&self) -> Vec<QueueMessage> {
        self.state.lock().await.dead_letters.clone()
    }

    /// Takes up to `max_messages` visible messages, marking them in flight.
    async fn take_visible(&self, max_messages: usize) -> Vec<QueueMessage> {
        let now = Instant::now();
        let mut state = self.state.lock().await;

        state
            .messages
            .iter_mut()
            .filter(|m| m.visible_at <= now)
            .take(max_messages)
            .map(|m| {
                let receipt = Uuid::new_v4().to_string();
                m.receive_count += 1;
                m.visible_at = now + self.visibility_timeout;
                m.receipt = Some(receipt.clone());

                QueueMessage {
                    message_id: m.message_id.clone(),
                    body: m.body.clone(),
                    receipt,
                    receive_count: m.receive_count,
                }
            })
            .collect()
    }
}

#[async_trait]
impl MessageQueue for MemoryQueue {
    async fn enqueue(&self, body: &str) -> Result<String> {
        let message_id = Uuid::new_v4().to_string();

        self.state.lock().await.messages.push_back(StoredMessage {
            message_id: message_id.clone(),
            body: body.to_string(),
            receive_count: 0,
            visible_at: Instant::now(),
            receipt: None,
        });
        self.arrivals.notify_waiters();

        tracing::trace!(%message_id, "Enqueued message");
        Ok(message_id)
    }

    async fn receive(&self, max_messages: usize, wait: Duration) -> Result<Vec<QueueMessage>> {
        if max_messages == 0 {
            return Ok(Vec::new());
        }

        let deadline = Instant::now() + wait;
        loop {
            let batch = self.take_visible(max_messages).await;
            if !batch.is_empty() {
                return Ok(batch);
            }

            let now = Instant::now();
            if now >= deadline {
                return Ok(Vec::new());
            }

            // Wake on a new message, or re-check for expired visibility.
            let step = (deadline - now).min(POLL_STEP);
            let _ = tokio::time::timeout(step, self.arrivals.notified()).await;
        }
    }

    async fn delete(&self, receipt: &str) -> Result<()> {
        let mut state = self.state.lock().await;

        let position = state
            .messages
            .iter()
            .position(|m| m.receipt.as_deref() == Some(receipt))
            .ok_or_else(|| QueueError::UnknownReceipt(receipt.to_string()))?;
        state.messages.remove(position);

        Ok(())
    }

    async fn dead_letter(&self, message: &QueueMessage) -> Result<()> {
        let mut state = self.state.lock().await;

        state.messages.retain(|m| m.message_id != message.message_id);
        state.dead_letters.push(message.clone());

        tracing::warn!(
            message_id = %message.message_id,
            receive_count = message.receive_count,
            "Message dead-lettered"
        );
        Ok(())
    }
}
