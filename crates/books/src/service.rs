//! Book service: validation and orchestration of CRUD over injected stores.
//!
//! In `Sync` mode writes go straight to the durable store. In `Async` mode a
//! new book takes an id reserved by the durable store, is staged in the
//! fast-write store under it, and a `Created` event is published for the
//! ingestion pipeline; updates and deletes stay
//! synchronous in both modes.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use thiserror::Error;

use books_core::book::{
    check_id_matches, error_messages, validate_book, Book, BookError, BookInput, UpdateBook,
};
use books_core::idempotency::{
    check, lookup, release, save, try_reserve, IdempotencyError, IdempotencyLedger,
    IdempotencyRecord,
};
use books_core::queue::{encode_event, BookEvent, MessageQueue, QueueError};
use books_core::storage::{BookRepository, RepositoryError, StagingRepository};

/// Which path `create` takes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WriteMode {
    #[default]
    Sync,
    Async,
}

impl FromStr for WriteMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sync" => Ok(Self::Sync),
            "async" => Ok(Self::Async),
            other => Err(format!("unknown write mode '{other}', expected 'sync' or 'async'")),
        }
    }
}

impl fmt::Display for WriteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sync => f.write_str("sync"),
            Self::Async => f.write_str("async"),
        }
    }
}

/// Errors surfaced by the book service.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Validation failed: {}", error_messages(.0).join(", "))]
    Validation(Vec<BookError>),
    #[error("{0}")]
    Mismatch(BookError),
    #[error("Book not found: {0}")]
    NotFound(i64),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Queue(#[from] QueueError),
    #[error(transparent)]
    Idempotency(#[from] IdempotencyError),
}

impl ServiceError {
    /// Messages returned to the client for a 400 response.
    pub fn client_messages(&self) -> Option<Vec<String>> {
        match self {
            Self::Validation(errors) => Some(error_messages(errors)),
            Self::Mismatch(error) => Some(vec![error.to_string()]),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ServiceError>;

/// Result of an idempotent create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdempotentOutcome {
    pub book: Book,
    /// True when the book came from the ledger instead of a new write.
    pub replayed: bool,
}

#[derive(Clone)]
enum WritePath {
    Durable,
    Staged {
        staging: Arc<dyn StagingRepository>,
        queue: Arc<dyn MessageQueue>,
    },
}

/// Orchestrates book operations over explicitly wired dependencies.
#[derive(Clone)]
pub struct BookService {
    books: Arc<dyn BookRepository>,
    ledger: Arc<dyn IdempotencyLedger>,
    write_path: WritePath,
}

impl BookService {
    /// Creates a service that writes synchronously to `books`.
    pub fn new(books: Arc<dyn BookRepository>, ledger: Arc<dyn IdempotencyLedger>) -> Self {
        Self {
            books,
            ledger,
            write_path: WritePath::Durable,
        }
    }

    /// Switches `create` to the staged path: reserve an id from the durable
    /// store, stage, then publish.
    pub fn with_staging(
        mut self,
        staging: Arc<dyn StagingRepository>,
        queue: Arc<dyn MessageQueue>,
    ) -> Self {
        self.write_path = WritePath::Staged { staging, queue };
        self
    }

    pub fn write_mode(&self) -> WriteMode {
        match self.write_path {
            WritePath::Durable => WriteMode::Sync,
            WritePath::Staged { .. } => WriteMode::Async,
        }
    }

    pub async fn list(&self) -> Result<Vec<Book>> {
        Ok(self.books.list_books().await?)
    }

    /// Gets a book by id.
    ///
    /// In async mode a book that is staged but not yet ingested is returned
    /// from the fast-write store.
    pub async fn get(&self, id: i64) -> Result<Book> {
        if let Some(book) = self.books.get_book(id).await? {
            return Ok(book);
        }

        if let WritePath::Staged { staging, .. } = &self.write_path {
            if let Some(book) = staging.get_staged(id).await? {
                return Ok(book);
            }
        }

        Err(ServiceError::NotFound(id))
    }

    /// Validates and persists a new book, returning it with its id.
    pub async fn create(&self, input: BookInput) -> Result<Book> {
        validate_book(&input).map_err(ServiceError::Validation)?;
        self.write(input).await
    }

    /// Creates a book at most once per idempotency key.
    ///
    /// A completed key replays the stored book unchanged. A key held by a
    /// request that has not finished fails with `InProgress`.
    pub async fn create_idempotent(
        &self,
        key: &str,
        input: BookInput,
    ) -> Result<IdempotentOutcome> {
        validate_book(&input).map_err(ServiceError::Validation)?;

        let ledger = self.ledger.as_ref();

        if let (true, Some(book)) = check::<Book, _>(ledger, key).await? {
            tracing::debug!(
                idempotency_key = key,
                book_id = book.id,
                "Replaying stored result"
            );
            return Ok(IdempotentOutcome { book, replayed: true });
        }

        if !try_reserve(ledger, key).await? {
            // Lost the race: replay if the winner already finished.
            return match lookup::<Book, _>(ledger, key).await? {
                Some(IdempotencyRecord::Completed(book)) => {
                    Ok(IdempotentOutcome { book, replayed: true })
                }
                _ => Err(IdempotencyError::InProgress(key.to_string()).into()),
            };
        }

        let book = match self.write(input).await {
            Ok(book) => book,
            Err(err) => {
                if let Err(release_err) = release(ledger, key).await {
                    tracing::warn!(
                        idempotency_key = key,
                        error = %release_err,
                        "Failed to release idempotency key"
                    );
                }
                return Err(err);
            }
        };

        // The book exists now; a failed save must not turn into an error
        // the client would retry.
        if let Err(err) = save(ledger, key, &book).await {
            tracing::error!(
                idempotency_key = key,
                book_id = book.id,
                error = %err,
                "Failed to save idempotency record"
            );
            if let Err(release_err) = release(ledger, key).await {
                tracing::warn!(
                    idempotency_key = key,
                    error = %release_err,
                    "Failed to release idempotency key"
                );
            }
        }

        Ok(IdempotentOutcome {
            book,
            replayed: false,
        })
    }

    /// Replaces every field of the book at `id`.
    pub async fn update(&self, id: i64, update: UpdateBook) -> Result<()> {
        check_id_matches(id, update.id).map_err(ServiceError::Mismatch)?;

        let book = update.into_book();
        validate_book(&BookInput::from(&book)).map_err(ServiceError::Validation)?;

        match self.books.update_book(&book).await {
            Ok(()) => Ok(()),
            Err(RepositoryError::NotFound(_)) => Err(ServiceError::NotFound(id)),
            Err(err) => Err(err.into()),
        }
    }

    /// Deletes a book. Returns false when it did not exist.
    pub async fn delete(&self, id: i64) -> Result<bool> {
        Ok(self.books.delete_book(id).await?)
    }

    async fn write(&self, input: BookInput) -> Result<Book> {
        match &self.write_path {
            WritePath::Durable => Ok(self.books.create_book(&input).await?),
            WritePath::Staged { staging, queue } => {
                let book = input.into_book(self.books.reserve_id().await?);
                staging.stage_book(&book).await?;
                let body = encode_event(&BookEvent::created(book.clone()))?;

                if let Err(err) = queue.enqueue(&body).await {
                    // Without a message the staged copy would never be ingested.
                    if let Err(remove_err) = staging.remove_staged(book.id).await {
                        tracing::warn!(
                            book_id = book.id,
                            error = %remove_err,
                            "Failed to remove orphaned staged book"
                        );
                    }
                    return Err(err.into());
                }

                tracing::debug!(book_id = book.id, title = %book.title, "Book staged and queued");
                Ok(book)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use async_trait::async_trait;
    use books_core::queue::{decode_payload, BookAction, QueueMessage};

    use crate::cache::ExpiringStore;
    use crate::idempotency::CacheIdempotencyLedger;
    use crate::queue::MemoryQueue;
    use crate::storage::{InMemoryBookRepository, InMemoryStagingRepository};
    use crate::testing::CountingRepository;

    type Repo = CountingRepository<InMemoryBookRepository>;

    fn ledger() -> Arc<CacheIdempotencyLedger> {
        Arc::new(CacheIdempotencyLedger::new(
            Arc::new(ExpiringStore::new()),
            Duration::from_secs(60),
            Duration::from_secs(10),
        ))
    }

    fn sync_service() -> (BookService, Arc<Repo>, Arc<CacheIdempotencyLedger>) {
        let repo = Arc::new(CountingRepository::new(InMemoryBookRepository::new()));
        let ledger = ledger();
        let service = BookService::new(repo.clone(), ledger.clone());
        (service, repo, ledger)
    }

    fn clean_code() -> BookInput {
        BookInput::new("Clean Code", "Robert C. Martin", 2008)
    }

    struct DownQueue;

    #[async_trait]
    impl MessageQueue for DownQueue {
        async fn enqueue(&self, _body: &str) -> books_core::queue::Result<String> {
            Err(QueueError::ConnectionFailed("queue is down".to_string()))
        }

        async fn receive(
            &self,
            _max_messages: usize,
            _wait: Duration,
        ) -> books_core::queue::Result<Vec<QueueMessage>> {
            Ok(Vec::new())
        }

        async fn delete(&self, _receipt: &str) -> books_core::queue::Result<()> {
            Ok(())
        }

        async fn dead_letter(&self, _message: &QueueMessage) -> books_core::queue::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_write_mode_parsing() {
        assert_eq!("sync".parse::<WriteMode>(), Ok(WriteMode::Sync));
        assert_eq!(" ASYNC ".parse::<WriteMode>(), Ok(WriteMode::Async));
        assert!("later".parse::<WriteMode>().is_err());
        assert_eq!(WriteMode::Async.to_string(), "async");
    }

    #[tokio::test]
    async fn test_invalid_create_never_touches_store() {
        let (service, repo, _) = sync_service();

        let err = service
            .create(BookInput::new("", "Someone", 2020))
            .await
            .unwrap_err();

        assert_eq!(
            err.client_messages(),
            Some(vec!["Title is required".to_string()])
        );
        assert_eq!(repo.create_calls(), 0);
    }

    #[tokio::test]
    async fn test_create_then_get() {
        let (service, _, _) = sync_service();

        let created = service.create(clean_code()).await.unwrap();
        let fetched = service.get(created.id).await.unwrap();

        assert_eq!(created.id, 1);
        assert_eq!(fetched, clean_code().into_book(1));
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let (service, _, _) = sync_service();

        assert!(matches!(service.get(9).await, Err(ServiceError::NotFound(9))));
    }

    #[tokio::test]
    async fn test_update_mismatch_leaves_store_untouched() {
        let (service, _, _) = sync_service();
        let created = service.create(clean_code()).await.unwrap();

        let update = UpdateBook {
            id: created.id + 1,
            title: "Other".to_string(),
            author: "Other".to_string(),
            year: 1999,
        };
        let err = service.update(created.id, update).await.unwrap_err();

        assert_eq!(err.client_messages(), Some(vec!["Id mismatch".to_string()]));
        assert_eq!(service.get(created.id).await.unwrap(), created);
    }

    #[tokio::test]
    async fn test_update_overwrites_fields() {
        let (service, _, _) = sync_service();
        let created = service.create(clean_code()).await.unwrap();

        let update = UpdateBook {
            id: created.id,
            title: "Clean Code".to_string(),
            author: "Updated".to_string(),
            year: 2008,
        };
        service.update(created.id, update).await.unwrap();

        assert_eq!(service.get(created.id).await.unwrap().author, "Updated");
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let (service, _, _) = sync_service();

        let update = UpdateBook {
            id: 4,
            title: "T".to_string(),
            author: "A".to_string(),
            year: 1,
        };

        assert!(matches!(
            service.update(4, update).await,
            Err(ServiceError::NotFound(4))
        ));
    }

    #[tokio::test]
    async fn test_delete_reports_existence() {
        let (service, _, _) = sync_service();
        let created = service.create(clean_code()).await.unwrap();

        assert!(service.delete(created.id).await.unwrap());
        assert!(!service.delete(created.id).await.unwrap());
        assert!(matches!(
            service.get(created.id).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_async_create_stages_and_publishes() {
        let staging = Arc::new(InMemoryStagingRepository::new());
        let queue = Arc::new(MemoryQueue::default());
        let service = BookService::new(Arc::new(InMemoryBookRepository::new()), ledger())
            .with_staging(staging.clone(), queue.clone());

        let book = service.create(clean_code()).await.unwrap();

        assert_eq!(service.write_mode(), WriteMode::Async);
        assert_eq!(staging.get_staged(book.id).await.unwrap(), Some(book.clone()));

        let messages = queue.receive(10, Duration::ZERO).await.unwrap();
        assert_eq!(messages.len(), 1);
        let event = decode_payload(&messages[0].body).unwrap();
        assert_eq!(event.action, BookAction::Created);
        assert_eq!(event.book, book);

        // Not ingested yet, but readable from the staging store.
        assert_eq!(service.get(book.id).await.unwrap(), book);
    }

    #[tokio::test]
    async fn test_async_create_takes_id_from_durable_store() {
        let store = Arc::new(InMemoryBookRepository::new());
        let existing = Book::new("Existing", "Keeper", 1999).with_id(1);
        store.upsert_book(&existing).await.unwrap();
        let staging = Arc::new(InMemoryStagingRepository::new());
        let service = BookService::new(store.clone(), ledger())
            .with_staging(staging.clone(), Arc::new(MemoryQueue::default()));

        let book = service.create(clean_code()).await.unwrap();

        assert_eq!(book.id, 2);
        assert_eq!(staging.get_staged(2).await.unwrap(), Some(book));
        assert_eq!(store.get_book(1).await.unwrap(), Some(existing));
    }

    #[tokio::test]
    async fn test_async_create_unstages_when_publish_fails() {
        let staging = Arc::new(InMemoryStagingRepository::new());
        let service = BookService::new(Arc::new(InMemoryBookRepository::new()), ledger())
            .with_staging(staging.clone(), Arc::new(DownQueue));

        let result = service.create(clean_code()).await;

        assert!(matches!(result, Err(ServiceError::Queue(_))));
        assert_eq!(staging.len().await, 0);
    }

    #[tokio::test]
    async fn test_idempotent_create_replays() {
        let (service, repo, _) = sync_service();

        let first = service.create_idempotent("key-1", clean_code()).await.unwrap();
        let second = service.create_idempotent("key-1", clean_code()).await.unwrap();

        assert!(!first.replayed);
        assert!(second.replayed);
        assert_eq!(first.book, second.book);
        assert_eq!(repo.create_calls(), 1);
        assert_eq!(service.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_distinct_keys_create_distinct_books() {
        let (service, _, _) = sync_service();

        let a = service.create_idempotent("a", clean_code()).await.unwrap();
        let b = service.create_idempotent("b", clean_code()).await.unwrap();

        assert_ne!(a.book.id, b.book.id);
    }

    #[tokio::test]
    async fn test_pending_key_is_in_progress() {
        let (service, repo, ledger) = sync_service();
        try_reserve(ledger.as_ref(), "busy").await.unwrap();

        let result = service.create_idempotent("busy", clean_code()).await;

        assert!(matches!(
            result,
            Err(ServiceError::Idempotency(IdempotencyError::InProgress(_)))
        ));
        assert_eq!(repo.create_calls(), 0);
    }

    #[tokio::test]
    async fn test_failed_create_releases_key() {
        let (service, repo, _) = sync_service();
        repo.set_fail_writes(true);

        assert!(service.create_idempotent("retry", clean_code()).await.is_err());

        repo.set_fail_writes(false);
        let outcome = service.create_idempotent("retry", clean_code()).await.unwrap();

        assert!(!outcome.replayed);
        assert_eq!(repo.create_calls(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_duplicates_create_once() {
        let (service, repo, _) = sync_service();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let service = service.clone();
                tokio::spawn(async move { service.create_idempotent("race", clean_code()).await })
            })
            .collect();

        let mut created = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(outcome) if !outcome.replayed => created += 1,
                Ok(_) | Err(ServiceError::Idempotency(IdempotencyError::InProgress(_))) => {}
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        assert_eq!(created, 1);
        assert_eq!(repo.create_calls(), 1);
    }
}
