use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

use crate::cache::{from_cache_bytes, to_cache_bytes};

use super::{IdempotencyRecord, Result};

/// Byte-level storage behind the idempotency helpers in this module.
///
/// Implementations own key namespacing and expiry. Records must not be
/// evicted before they expire, or a retried request would run twice.
#[async_trait]
pub trait IdempotencyLedger: Send + Sync {
    /// Reads the raw record stored under `key`.
    async fn load(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Writes a completed `record` under `key`, replacing whatever was
    /// there. It lives for the full retention window.
    async fn store(&self, key: &str, record: &[u8]) -> Result<()>;

    /// Writes a pending `record` only if nothing is stored under `key`.
    /// Returns true when this call wrote it. The reservation lives only for
    /// the short reservation window, so a request that dies before `store`
    /// frees the key quickly.
    async fn store_if_absent(&self, key: &str, record: &[u8]) -> Result<bool>;

    /// Removes the record under `key`.
    async fn remove(&self, key: &str) -> Result<()>;
}

/// Reads and decodes the record for `key`.
pub async fn lookup<T, L>(ledger: &L, key: &str) -> Result<Option<IdempotencyRecord<T>>>
where
    T: DeserializeOwned,
    L: IdempotencyLedger + ?Sized,
{
    match ledger.load(key).await? {
        Some(bytes) => Ok(Some(from_cache_bytes(&bytes)?)),
        None => Ok(None),
    }
}

/// Returns `(true, Some(value))` when a completed result is stored for `key`.
///
/// A pending reservation counts as not found: the caller has nothing to
/// replay yet.
pub async fn check<T, L>(ledger: &L, key: &str) -> Result<(bool, Option<T>)>
where
    T: DeserializeOwned,
    L: IdempotencyLedger + ?Sized,
{
    match lookup::<T, L>(ledger, key).await? {
        Some(IdempotencyRecord::Completed(value)) => Ok((true, Some(value))),
        Some(IdempotencyRecord::Pending) | None => Ok((false, None)),
    }
}

/// Stores the completed result for `key`, overwriting any previous record.
pub async fn save<T, L>(ledger: &L, key: &str, value: &T) -> Result<()>
where
    T: Serialize,
    L: IdempotencyLedger + ?Sized,
{
    let bytes = to_cache_bytes(&IdempotencyRecord::Completed(value))?;
    ledger.store(key, &bytes).await
}

/// Atomically claims `key` with a pending marker. Returns false when another
/// request already holds or completed it.
pub async fn try_reserve<L>(ledger: &L, key: &str) -> Result<bool>
where
    L: IdempotencyLedger + ?Sized,
{
    let bytes = to_cache_bytes(&IdempotencyRecord::<()>::Pending)?;
    ledger.store_if_absent(key, &bytes).await
}

/// Drops a reservation so the key can be retried.
pub async fn release<L>(ledger: &L, key: &str) -> Result<()>
where
    L: IdempotencyLedger + ?Sized,
{
    ledger.remove(key).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::book::Book;
    use std::collections::HashMap;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct MapLedger {
        records: Mutex<HashMap<String, Vec<u8>>>,
    }

    #[async_trait]
    impl IdempotencyLedger for MapLedger {
        async fn load(&self, key: &str) -> Result<Option<Vec<u8>>> {
            Ok(self.records.lock().await.get(key).cloned())
        }

        async fn store(&self, key: &str, record: &[u8]) -> Result<()> {
            self.records
                .lock()
                .await
                .insert(key.to_string(), record.to_vec());
            Ok(())
        }

        async fn store_if_absent(&self, key: &str, record: &[u8]) -> Result<bool> {
            let mut records = self.records.lock().await;
            if records.contains_key(key) {
                return Ok(false);
            }
            records.insert(key.to_string(), record.to_vec());
            Ok(true)
        }

        async fn remove(&self, key: &str) -> Result<()> {
            self.records.lock().await.remove(key);
            Ok(())
        }
    }

    fn book() -> Book {
        Book::new("Idempotent", "Writer", 2020).with_id(11)
    }

    #[tokio::test]
    async fn test_check_before_save_is_not_found() {
        let ledger = MapLedger::default();

        let (found, value) = check::<Book, _>(&ledger, "k1").await.unwrap();

        assert!(!found);
        assert_eq!(value, None);
    }

    #[tokio::test]
    async fn test_check_after_save_returns_value() {
        let ledger = MapLedger::default();

        save(&ledger, "k1", &book()).await.unwrap();
        let (found, value) = check::<Book, _>(&ledger, "k1").await.unwrap();

        assert!(found);
        assert_eq!(value, Some(book()));
    }

    #[tokio::test]
    async fn test_save_overwrites() {
        let ledger = MapLedger::default();

        save(&ledger, "k1", &book()).await.unwrap();
        save(&ledger, "k1", &book().with_id(12)).await.unwrap();

        let (_, value) = check::<Book, _>(&ledger, "k1").await.unwrap();
        assert_eq!(value.map(|b| b.id), Some(12));
    }

    #[tokio::test]
    async fn test_reservation_is_exclusive_and_not_replayable() {
        let ledger = MapLedger::default();

        assert!(try_reserve(&ledger, "k1").await.unwrap());
        assert!(!try_reserve(&ledger, "k1").await.unwrap());

        let (found, _) = check::<Book, _>(&ledger, "k1").await.unwrap();
        assert!(!found);

        let record = lookup::<Book, _>(&ledger, "k1").await.unwrap();
        assert_eq!(record, Some(IdempotencyRecord::Pending));
    }

    #[tokio::test]
    async fn test_release_allows_new_reservation() {
        let ledger = MapLedger::default();

        assert!(try_reserve(&ledger, "k1").await.unwrap());
        release(&ledger, "k1").await.unwrap();

        assert!(try_reserve(&ledger, "k1").await.unwrap());
    }

    #[tokio::test]
    async fn test_completed_key_cannot_be_reserved() {
        let ledger = MapLedger::default();

        save(&ledger, "k1", &book()).await.unwrap();

        assert!(!try_reserve(&ledger, "k1").await.unwrap());
    }

    #[tokio::test]
    async fn test_corrupt_record_is_an_error() {
        let ledger = MapLedger::default();
        ledger.store("k1", b"garbage").await.unwrap();

        assert!(check::<Book, _>(&ledger, "k1").await.is_err());
    }
}
