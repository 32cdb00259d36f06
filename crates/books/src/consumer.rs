//! Ingestion pipeline: drains book events from the queue into the durable
//! store and keeps the cache in step.
//!
//! Delivery is at least once, so every step is safe to repeat. A `Created`
//! book is inserted only if its id is free, and only while its staged copy
//! is still waiting; once ingested the staged copy is removed, so a late
//! duplicate can neither revert a later update nor bring back a deleted
//! book. `Updated` books are upserted and cache entries are overwritten or
//! deleted. A message is deleted only after every step succeeded; otherwise
//! the delivery policy decides between redelivery and the dead-letter sink.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::broadcast;

use books_core::book::{error_messages, validate_book, Book, BookError, BookInput};
use books_core::cache::{Cache, CacheError};
use books_core::queue::{
    decode_payload, BookAction, DeliveryPolicy, Disposition, FailureKind, MessageQueue,
    QueueError, QueueMessage,
};
use books_core::storage::{BookRepository, RepositoryError, StagingRepository};

use crate::storage::cached::{evict_book, refresh_book};

/// Tuning knobs for the consumer loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsumerSettings {
    /// Messages requested per receive.
    pub batch_size: usize,
    /// Long-poll wait for a receive.
    pub wait: Duration,
    /// Pause between cycles.
    pub poll_interval: Duration,
    /// TTL of the per-book cache entry written after ingest.
    pub cache_ttl: Duration,
    pub policy: DeliveryPolicy,
}

impl Default for ConsumerSettings {
    fn default() -> Self {
        Self {
            batch_size: 10,
            wait: Duration::from_secs(5),
            poll_interval: Duration::from_millis(1000),
            cache_ttl: Duration::from_secs(300),
            policy: DeliveryPolicy::default(),
        }
    }
}

/// Outcome of one receive-and-process cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub processed: usize,
    pub retried: usize,
    pub dead_lettered: usize,
}

impl CycleReport {
    pub fn is_empty(&self) -> bool {
        self.processed == 0 && self.retried == 0 && self.dead_lettered == 0
    }
}

#[derive(Debug, Error)]
enum ProcessError {
    #[error(transparent)]
    Malformed(QueueError),
    #[error("invalid book: {}", error_messages(.0).join(", "))]
    Invalid(Vec<BookError>),
    #[error(transparent)]
    Store(#[from] RepositoryError),
    #[error(transparent)]
    Cache(#[from] CacheError),
}

impl ProcessError {
    fn kind(&self) -> FailureKind {
        match self {
            Self::Malformed(_) | Self::Invalid(_) => FailureKind::Malformed,
            Self::Store(_) | Self::Cache(_) => FailureKind::Processing,
        }
    }
}

/// Background consumer moving books from the queue into the durable store.
pub struct BookConsumer {
    queue: Arc<dyn MessageQueue>,
    books: Arc<dyn BookRepository>,
    cache: Arc<dyn Cache>,
    staging: Option<Arc<dyn StagingRepository>>,
    settings: ConsumerSettings,
}

impl BookConsumer {
    /// `books` must be the undecorated durable store: the consumer maintains
    /// the cache itself and treats cache failures as retryable.
    pub fn new(
        queue: Arc<dyn MessageQueue>,
        books: Arc<dyn BookRepository>,
        cache: Arc<dyn Cache>,
        settings: ConsumerSettings,
    ) -> Self {
        Self {
            queue,
            books,
            cache,
            staging: None,
            settings,
        }
    }

    /// Checks `Created` events against `staging` and removes staged copies
    /// once they are ingested.
    pub fn with_staging(mut self, staging: Arc<dyn StagingRepository>) -> Self {
        self.staging = Some(staging);
        self
    }

    /// Runs until `shutdown` fires or its sender is dropped.
    ///
    /// Shutdown is observed while waiting on the queue or between cycles,
    /// never in the middle of a message.
    pub async fn run(&self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            batch_size = self.settings.batch_size,
            wait_secs = self.settings.wait.as_secs(),
            poll_interval_ms = self.settings.poll_interval.as_millis() as u64,
            "Book consumer started"
        );

        loop {
            let received = tokio::select! {
                _ = shutdown.recv() => break,
                received = self.receive() => received,
            };

            match received {
                Ok(messages) if !messages.is_empty() => {
                    let report = self.process_batch(messages).await;
                    tracing::debug!(
                        processed = report.processed,
                        retried = report.retried,
                        dead_lettered = report.dead_lettered,
                        "Consumer cycle finished"
                    );
                }
                Ok(_) => {}
                Err(err) => {
                    tracing::error!(error = %err, "Failed to receive messages");
                }
            }

            tokio::select! {
                _ = shutdown.recv() => break,
                _ = tokio::time::sleep(self.settings.poll_interval) => {}
            }
        }

        tracing::info!("Book consumer stopped");
    }

    /// Runs a single receive-and-process cycle.
    pub async fn run_once(&self) -> Result<CycleReport, QueueError> {
        let messages = self.receive().await?;
        Ok(self.process_batch(messages).await)
    }

    async fn receive(&self) -> Result<Vec<QueueMessage>, QueueError> {
        self.queue
            .receive(self.settings.batch_size, self.settings.wait)
            .await
    }

    async fn process_batch(&self, messages: Vec<QueueMessage>) -> CycleReport {
        let mut report = CycleReport::default();

        for message in &messages {
            match self.process(message).await {
                Ok(()) => report.processed += 1,
                Err(err) => self.handle_failure(message, err, &mut report).await,
            }
        }

        report
    }

    async fn process(&self, message: &QueueMessage) -> Result<(), ProcessError> {
        let event = decode_payload(&message.body).map_err(ProcessError::Malformed)?;
        let book = event.book;

        match event.action {
            BookAction::Created => {
                validate_book(&BookInput::from(&book)).map_err(ProcessError::Invalid)?;
                self.ingest_created(&book).await?;
            }
            BookAction::Updated => {
                validate_book(&BookInput::from(&book)).map_err(ProcessError::Invalid)?;
                self.books.upsert_book(&book).await?;
                refresh_book(self.cache.as_ref(), &book, self.settings.cache_ttl).await?;
            }
            BookAction::Deleted => {
                self.books.delete_book(book.id).await?;
                evict_book(self.cache.as_ref(), book.id).await?;
            }
        }

        self.unstage(book.id).await?;

        if let Err(err) = self.queue.delete(&message.receipt).await {
            // The work is done; a redelivery repeats it harmlessly.
            tracing::warn!(
                message_id = %message.message_id,
                error = %err,
                "Failed to delete processed message"
            );
        }

        tracing::debug!(
            message_id = %message.message_id,
            book_id = book.id,
            action = ?event.action,
            "Message ingested"
        );
        Ok(())
    }

    /// Inserts a newly created book unless it was already ingested.
    async fn ingest_created(&self, book: &Book) -> Result<(), ProcessError> {
        if let Some(staging) = &self.staging {
            if staging.get_staged(book.id).await?.is_none() {
                tracing::debug!(book_id = book.id, "No staged copy left, skipping duplicate");
                return Ok(());
            }
        }

        if self.books.insert_book(book).await? {
            refresh_book(self.cache.as_ref(), book, self.settings.cache_ttl).await?;
        } else {
            tracing::debug!(book_id = book.id, "Book already stored, keeping existing row");
        }
        Ok(())
    }

    /// The staged copy must be gone before the message is deleted, or a
    /// redelivered `Created` would be applied again.
    async fn unstage(&self, id: i64) -> Result<(), ProcessError> {
        if let Some(staging) = &self.staging {
            staging.remove_staged(id).await?;
        }
        Ok(())
    }

    async fn handle_failure(
        &self,
        message: &QueueMessage,
        err: ProcessError,
        report: &mut CycleReport,
    ) {
        let disposition = self
            .settings
            .policy
            .disposition(message.receive_count, err.kind());

        match disposition {
            Disposition::Retry => {
                tracing::warn!(
                    message_id = %message.message_id,
                    receive_count = message.receive_count,
                    error = %err,
                    "Message processing failed, leaving it for redelivery"
                );
                report.retried += 1;
            }
            Disposition::DeadLetter => {
                tracing::error!(
                    message_id = %message.message_id,
                    receive_count = message.receive_count,
                    error = %err,
                    "Message processing failed, dead-lettering"
                );
                match self.queue.dead_letter(message).await {
                    Ok(()) => report.dead_lettered += 1,
                    Err(dlq_err) => {
                        tracing::error!(
                            message_id = %message.message_id,
                            error = %dlq_err,
                            "Failed to dead-letter message"
                        );
                        report.retried += 1;
                    }
                }
            }
        }
    }
}
