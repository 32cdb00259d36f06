//! Idempotency ledger over a dedicated key-value store.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use books_core::cache::{idempotency_key, Cache};
use books_core::idempotency::{IdempotencyLedger, Result};

/// Stores idempotency records under the `idempotency_` prefix.
///
/// `store` must be a non-evicting store: `ExpiringStore` in memory, or a
/// Redis instance running with `maxmemory-policy noeviction`. Completed
/// records expire after `ttl`, pending reservations after `pending_ttl`.
#[derive(Clone)]
pub struct CacheIdempotencyLedger {
    store: Arc<dyn Cache>,
    ttl: Duration,
    pending_ttl: Duration,
}

impl CacheIdempotencyLedger {
    pub fn new(store: Arc<dyn Cache>, ttl: Duration, pending_ttl: Duration) -> Self {
        Self {
            store,
            ttl,
            pending_ttl,
        }
    }
}

#[async_trait]
impl IdempotencyLedger for CacheIdempotencyLedger {
    async fn load(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.store.get(&idempotency_key(key)).await?)
    }

    async fn store(&self, key: &str, record: &[u8]) -> Result<()> {
        self.store
            .set(&idempotency_key(key), record, Some(self.ttl))
            .await?;
        Ok(())
    }

    async fn store_if_absent(&self, key: &str, record: &[u8]) -> Result<bool> {
        Ok(self
            .store
            .set_if_absent(&idempotency_key(key), record, Some(self.pending_ttl))
            .await?)
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.store.delete(&idempotency_key(key)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ExpiringStore;
    use books_core::book::Book;
    use books_core::idempotency::{check, lookup, release, save, try_reserve, IdempotencyRecord};

    fn ledger() -> (CacheIdempotencyLedger, Arc<ExpiringStore>) {
        let store = Arc::new(ExpiringStore::new());
        let ledger = CacheIdempotencyLedger::new(
            store.clone(),
            Duration::from_secs(60),
            Duration::from_secs(10),
        );
        (ledger, store)
    }

    #[tokio::test]
    async fn test_check_before_save_is_not_found() {
        let (ledger, _) = ledger();

        let (found, value) = check::<Book, _>(&ledger, "k1").await.unwrap();

        assert!(!found);
        assert!(value.is_none());
    }

    #[tokio::test]
    async fn test_save_then_check_returns_value() {
        let (ledger, _) = ledger();
        let book = Book::new("Clean Code", "Robert C. Martin", 2008).with_id(1);

        save(&ledger, "k1", &book).await.unwrap();
        let (found, value) = check::<Book, _>(&ledger, "k1").await.unwrap();

        assert!(found);
        assert_eq!(value, Some(book));
    }

    #[tokio::test]
    async fn test_records_are_namespaced() {
        let (ledger, store) = ledger();

        save(&ledger, "abc", &1_i64).await.unwrap();

        assert!(store.get("abc").await.unwrap().is_none());
        assert!(store.get(&idempotency_key("abc")).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_reserve_is_exclusive() {
        let (ledger, _) = ledger();

        assert!(try_reserve(&ledger, "k").await.unwrap());
        assert!(!try_reserve(&ledger, "k").await.unwrap());

        let record = lookup::<Book, _>(&ledger, "k").await.unwrap();
        assert_eq!(record, Some(IdempotencyRecord::Pending));
    }

    #[tokio::test]
    async fn test_release_frees_the_key() {
        let (ledger, _) = ledger();

        try_reserve(&ledger, "k").await.unwrap();
        release(&ledger, "k").await.unwrap();

        assert!(try_reserve(&ledger, "k").await.unwrap());
    }

    #[tokio::test]
    async fn test_abandoned_reservation_expires_before_retention() {
        let ledger = CacheIdempotencyLedger::new(
            Arc::new(ExpiringStore::new()),
            Duration::from_secs(60),
            Duration::from_millis(20),
        );

        assert!(try_reserve(&ledger, "crashed").await.unwrap());
        tokio::time::sleep(Duration::from_millis(40)).await;

        assert_eq!(lookup::<Book, _>(&ledger, "crashed").await.unwrap(), None);
        assert!(try_reserve(&ledger, "crashed").await.unwrap());
    }

    #[tokio::test]
    async fn test_completed_record_outlives_reservation_window() {
        let ledger = CacheIdempotencyLedger::new(
            Arc::new(ExpiringStore::new()),
            Duration::from_secs(60),
            Duration::from_millis(20),
        );

        try_reserve(&ledger, "done").await.unwrap();
        save(&ledger, "done", &7_i64).await.unwrap();
        tokio::time::sleep(Duration::from_millis(40)).await;

        let (found, value) = check::<i64, _>(&ledger, "done").await.unwrap();
        assert!(found);
        assert_eq!(value, Some(7));
    }

    #[tokio::test]
    async fn test_completed_records_expire() {
        let ledger = CacheIdempotencyLedger::new(
            Arc::new(ExpiringStore::new()),
            Duration::from_millis(20),
            Duration::from_millis(20),
        );

        save(&ledger, "short", &7_i64).await.unwrap();
        tokio::time::sleep(Duration::from_millis(40)).await;

        let (found, _) = check::<i64, _>(&ledger, "short").await.unwrap();
        assert!(!found);
    }
}
