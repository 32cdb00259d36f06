//! Test doubles shared by the unit tests of this crate.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use books_core::book::{Book, BookInput};
use books_core::cache::{Cache, CacheError, Result as CacheResult};
use books_core::storage::{BookRepository, RepositoryError, Result};

/// Cache whose every operation fails, as if Redis were down.
pub struct FailingCache;

#[async_trait]
impl Cache for FailingCache {
    async fn get(&self, _key: &str) -> CacheResult<Option<Vec<u8>>> {
        Err(CacheError::ConnectionFailed("cache is down".to_string()))
    }

    async fn set(&self, _key: &str, _value: &[u8], _ttl: Option<Duration>) -> CacheResult<()> {
        Err(CacheError::ConnectionFailed("cache is down".to_string()))
    }

    async fn set_if_absent(
        &self,
        _key: &str,
        _value: &[u8],
        _ttl: Option<Duration>,
    ) -> CacheResult<bool> {
        Err(CacheError::ConnectionFailed("cache is down".to_string()))
    }

    async fn delete(&self, _key: &str) -> CacheResult<()> {
        Err(CacheError::ConnectionFailed("cache is down".to_string()))
    }
}

/// Repository wrapper that counts reads and can be switched to fail writes.
pub struct CountingRepository<R> {
    inner: R,
    get_calls: AtomicUsize,
    list_calls: AtomicUsize,
    create_calls: AtomicUsize,
    fail_writes: AtomicBool,
}

impl<R: BookRepository> CountingRepository<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            get_calls: AtomicUsize::new(0),
            list_calls: AtomicUsize::new(0),
            create_calls: AtomicUsize::new(0),
            fail_writes: AtomicBool::new(false),
        }
    }

    pub fn inner(&self) -> &R {
        &self.inner
    }

    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable("database is down".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl<R: BookRepository> BookRepository for CountingRepository<R> {
    async fn list_books(&self) -> Result<Vec<Book>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.list_books().await
    }

    async fn get_book(&self, id: i64) -> Result<Option<Book>> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.get_book(id).await
    }

    async fn reserve_id(&self) -> Result<i64> {
        self.check_writable()?;
        self.inner.reserve_id().await
    }

    async fn create_book(&self, input: &BookInput) -> Result<Book> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        self.check_writable()?;
        self.inner.create_book(input).await
    }

    async fn insert_book(&self, book: &Book) -> Result<bool> {
        self.check_writable()?;
        self.inner.insert_book(book).await
    }

    async fn upsert_book(&self, book: &Book) -> Result<()> {
        self.check_writable()?;
        self.inner.upsert_book(book).await
    }

    async fn update_book(&self, book: &Book) -> Result<()> {
        self.check_writable()?;
        self.inner.update_book(book).await
    }

    async fn delete_book(&self, id: i64) -> Result<bool> {
        self.check_writable()?;
        self.inner.delete_book(id).await
    }
}
