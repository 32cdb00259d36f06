//! Cached book repository decorator.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use books_core::book::{Book, BookInput};
use books_core::cache::{
    book_key, books_all_key, from_cache_bytes, to_cache_bytes, Cache, Result as CacheResult,
};
use books_core::storage::{BookRepository, Result};

/// Drops the aggregate list and stores the current value of `book`.
pub async fn refresh_book<C>(cache: &C, book: &Book, ttl: Duration) -> CacheResult<()>
where
    C: Cache + ?Sized,
{
    cache.delete(&books_all_key()).await?;
    let bytes = to_cache_bytes(book)?;
    cache.set(&book_key(book.id), &bytes, Some(ttl)).await
}

/// Drops the aggregate list and the entry for `id`.
pub async fn evict_book<C>(cache: &C, id: i64) -> CacheResult<()>
where
    C: Cache + ?Sized,
{
    cache.delete(&books_all_key()).await?;
    cache.delete(&book_key(id)).await
}

/// Cached book repository decorator.
///
/// Cache failures are logged and never fail the request: the repository is
/// the source of truth and cache entries are disposable.
///
/// # Type Parameters
///
/// * `R` - The underlying repository implementation
/// * `C` - The cache implementation
pub struct CachedBookRepository<R, C>
where
    R: BookRepository + ?Sized,
    C: Cache + ?Sized,
{
    repository: Arc<R>,
    cache: Arc<C>,
    ttl: Duration,
}

impl<R, C> CachedBookRepository<R, C>
where
    R: BookRepository + ?Sized,
    C: Cache + ?Sized,
{
    /// Creates a new cached book repository.
    ///
    /// # Arguments
    ///
    /// * `repository` - The underlying repository to cache
    /// * `cache` - The cache implementation
    /// * `ttl` - Time-to-live for cached values
    pub fn new(repository: Arc<R>, cache: Arc<C>, ttl: Duration) -> Self {
        Self {
            repository,
            cache,
            ttl,
        }
    }

    async fn cached<T>(&self, key: &str) -> Option<T>
    where
        T: serde::de::DeserializeOwned,
    {
        match self.cache.get(key).await {
            Ok(Some(bytes)) => match from_cache_bytes(&bytes) {
                Ok(value) => {
                    tracing::trace!(key, "Cache hit");
                    Some(value)
                }
                Err(err) => {
                    // Treat undecodable entries as a miss
                    tracing::warn!(key, error = %err, "Cache value deserialization failed");
                    None
                }
            },
            Ok(None) => {
                tracing::trace!(key, "Cache miss");
                None
            }
            Err(err) => {
                tracing::warn!(key, error = %err, "Cache read failed");
                None
            }
        }
    }

    async fn populate<T>(&self, key: &str, value: &T)
    where
        T: serde::Serialize + ?Sized,
    {
        let result = match to_cache_bytes(value) {
            Ok(bytes) => self.cache.set(key, &bytes, Some(self.ttl)).await,
            Err(err) => Err(err),
        };
        if let Err(err) = result {
            tracing::warn!(key, error = %err, "Failed to populate cache");
        }
    }

    async fn after_write(&self, book: &Book) {
        if let Err(err) = refresh_book(self.cache.as_ref(), book, self.ttl).await {
            tracing::warn!(book_id = book.id, error = %err, "Failed to refresh book cache");
        }
    }
}

#[async_trait]
impl<R, C> BookRepository for CachedBookRepository<R, C>
where
    R: BookRepository + ?Sized + 'static,
    C: Cache + ?Sized + 'static,
{
    async fn list_books(&self) -> Result<Vec<Book>> {
        let key = books_all_key();
        if let Some(books) = self.cached::<Vec<Book>>(&key).await {
            return Ok(books);
        }

        let books = self.repository.list_books().await?;
        self.populate(&key, &books).await;
        Ok(books)
    }

    async fn get_book(&self, id: i64) -> Result<Option<Book>> {
        let key = book_key(id);
        if let Some(book) = self.cached::<Book>(&key).await {
            return Ok(Some(book));
        }

        let book = self.repository.get_book(id).await?;
        if let Some(ref b) = book {
            self.populate(&key, b).await;
        }
        Ok(book)
    }

    async fn reserve_id(&self) -> Result<i64> {
        self.repository.reserve_id().await
    }

    async fn create_book(&self, input: &BookInput) -> Result<Book> {
        let book = self.repository.create_book(input).await?;
        self.after_write(&book).await;

        tracing::debug!(book_id = book.id, title = %book.title, "Book created");
        Ok(book)
    }

    async fn insert_book(&self, book: &Book) -> Result<bool> {
        let inserted = self.repository.insert_book(book).await?;
        if inserted {
            self.after_write(book).await;
        }
        Ok(inserted)
    }

    async fn upsert_book(&self, book: &Book) -> Result<()> {
        self.repository.upsert_book(book).await?;
        self.after_write(book).await;
        Ok(())
    }

    async fn update_book(&self, book: &Book) -> Result<()> {
        self.repository.update_book(book).await?;
        self.after_write(book).await;

        tracing::debug!(book_id = book.id, "Book updated");
        Ok(())
    }

    async fn delete_book(&self, id: i64) -> Result<bool> {
        let removed = self.repository.delete_book(id).await?;

        if let Err(err) = evict_book(self.cache.as_ref(), id).await {
            tracing::warn!(book_id = id, error = %err, "Failed to invalidate book cache");
        }

        tracing::debug!(book_id = id, removed, "Book deleted");
        Ok(removed)
    }
}
