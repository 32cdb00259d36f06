//! Application state and backend wiring.
//!
//! Every store, cache and queue is built once here and handed to the
//! components that need it. Feature flags pick the concrete backends:
//!
//! | Concern          | Default                     | Feature  | Backend                     |
//! |------------------|-----------------------------|----------|-----------------------------|
//! | Durable store    | `InMemoryBookRepository`    | `sqlite` | `SqliteBookRepository`      |
//! | Fast-write store | `InMemoryStagingRepository` | `aws`    | `DynamoDbStagingRepository` |
//! | Queue            | `MemoryQueue`               | `aws`    | `SqsQueue`                  |
//! | Cache            | `MemoryCache`               | `redis`  | `RedisCache`                |
//! | Ledger store     | `ExpiringStore`             | `redis`  | `RedisCache`                |
//!
//! The ledger store never shares the bounded in-memory cache: read traffic
//! must not evict idempotency records. A Redis deployment backing both has
//! to run with `maxmemory-policy noeviction`.

use std::sync::Arc;

use tokio::sync::broadcast;

use books_auth::AuthState;
use books_core::cache::Cache;
use books_core::queue::MessageQueue;
use books_core::storage::{BookRepository, StagingRepository};

use crate::config::Config;
use crate::consumer::BookConsumer;
use crate::idempotency::CacheIdempotencyLedger;
use crate::service::{BookService, WriteMode};
use crate::storage::CachedBookRepository;

/// The external collaborators of the service.
#[derive(Clone)]
pub struct Backends {
    /// Durable store, undecorated.
    pub store: Arc<dyn BookRepository>,
    pub cache: Arc<dyn Cache>,
    /// Non-evicting store holding idempotency records.
    pub ledger_store: Arc<dyn Cache>,
    pub staging: Arc<dyn StagingRepository>,
    pub queue: Arc<dyn MessageQueue>,
}

impl Backends {
    /// Builds the backends selected by the enabled features.
    pub async fn from_config(config: &Config) -> anyhow::Result<Self> {
        let store = durable_store(config).await?;
        let cache = cache(config).await?;
        let ledger_store = ledger_store(&cache);
        let (staging, queue) = staging_and_queue(config).await?;

        Ok(Self {
            store,
            cache,
            ledger_store,
            staging,
            queue,
        })
    }

    /// In-process backends only, whatever the enabled features.
    #[cfg(test)]
    pub fn in_memory(config: &Config) -> Self {
        use crate::cache::{ExpiringStore, MemoryCache};
        use crate::queue::MemoryQueue;
        use crate::storage::{InMemoryBookRepository, InMemoryStagingRepository};

        Self {
            store: Arc::new(InMemoryBookRepository::new()),
            cache: Arc::new(MemoryCache::new(config.cache_max_entries)),
            ledger_store: Arc::new(ExpiringStore::new()),
            staging: Arc::new(InMemoryStagingRepository::new()),
            queue: Arc::new(MemoryQueue::new(config.queue_visibility_timeout())),
        }
    }

    /// The ingestion pipeline over these backends.
    pub fn consumer(&self, config: &Config) -> BookConsumer {
        BookConsumer::new(
            self.queue.clone(),
            self.store.clone(),
            self.cache.clone(),
            config.consumer_settings(),
        )
        .with_staging(self.staging.clone())
    }
}

#[cfg(feature = "sqlite")]
async fn durable_store(config: &Config) -> anyhow::Result<Arc<dyn BookRepository>> {
    use crate::storage::SqliteBookRepository;

    tracing::info!(path = %config.sqlite_path, "Using SQLite durable store");
    Ok(Arc::new(SqliteBookRepository::new(&config.sqlite_path).await?))
}

#[cfg(not(feature = "sqlite"))]
async fn durable_store(_config: &Config) -> anyhow::Result<Arc<dyn BookRepository>> {
    tracing::info!("Using in-memory durable store");
    Ok(Arc::new(crate::storage::InMemoryBookRepository::new()))
}

#[cfg(feature = "redis")]
async fn cache(config: &Config) -> anyhow::Result<Arc<dyn Cache>> {
    use crate::cache::RedisCache;

    tracing::info!(url = %config.redis_url, "Using Redis cache");
    Ok(Arc::new(RedisCache::new(&config.redis_url).await?))
}

#[cfg(not(feature = "redis"))]
async fn cache(config: &Config) -> anyhow::Result<Arc<dyn Cache>> {
    tracing::info!(max_entries = config.cache_max_entries, "Using in-memory cache");
    Ok(Arc::new(crate::cache::MemoryCache::new(config.cache_max_entries)))
}

#[cfg(feature = "redis")]
fn ledger_store(cache: &Arc<dyn Cache>) -> Arc<dyn Cache> {
    tracing::info!("Using Redis for idempotency records; Redis must not evict keys");
    cache.clone()
}

#[cfg(not(feature = "redis"))]
fn ledger_store(_cache: &Arc<dyn Cache>) -> Arc<dyn Cache> {
    Arc::new(crate::cache::ExpiringStore::new())
}

#[cfg(feature = "aws")]
async fn staging_and_queue(
    config: &Config,
) -> anyhow::Result<(Arc<dyn StagingRepository>, Arc<dyn MessageQueue>)> {
    use crate::queue::SqsQueue;
    use crate::storage::DynamoDbStagingRepository;

    let queue_url = config
        .sqs_queue_url
        .clone()
        .ok_or_else(|| anyhow::anyhow!("SQS_QUEUE_URL must be set"))?;

    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let staging = DynamoDbStagingRepository::new(
        aws_sdk_dynamodb::Client::new(&aws_config),
        config.dynamodb_table_name.clone(),
    );
    let queue = SqsQueue::new(
        aws_sdk_sqs::Client::new(&aws_config),
        queue_url,
        config.sqs_dlq_url.clone(),
    );

    tracing::info!(
        table = %config.dynamodb_table_name,
        queue = %queue.queue_url(),
        dead_letter_queue = config.sqs_dlq_url.as_deref().unwrap_or("-"),
        "Using DynamoDB staging store and SQS queue"
    );
    Ok((Arc::new(staging), Arc::new(queue)))
}

#[cfg(not(feature = "aws"))]
async fn staging_and_queue(
    config: &Config,
) -> anyhow::Result<(Arc<dyn StagingRepository>, Arc<dyn MessageQueue>)> {
    tracing::info!("Using in-memory staging store and queue");
    Ok((
        Arc::new(crate::storage::InMemoryStagingRepository::new()),
        Arc::new(crate::queue::MemoryQueue::new(
            config.queue_visibility_timeout(),
        )),
    ))
}

/// The idempotency ledger over the backends' ledger store.
pub fn idempotency_ledger(config: &Config, backends: &Backends) -> CacheIdempotencyLedger {
    CacheIdempotencyLedger::new(
        backends.ledger_store.clone(),
        config.idempotency_ttl(),
        config.idempotency_pending_ttl(),
    )
}

/// Shared application state.
///
/// This is cloned for each request handler.
#[derive(Clone)]
pub struct AppState {
    pub service: BookService,
    /// Durable store, probed by `/health`.
    pub store: Arc<dyn BookRepository>,
    /// Cache, probed by `/health`.
    pub cache: Arc<dyn Cache>,
    pub auth: AuthState,
    /// Shutdown signal sender for background tasks.
    pub shutdown_tx: broadcast::Sender<()>,
}

impl AppState {
    /// Wires the service over `backends`: reads and writes go through the
    /// cache-aside decorator, `POST /books` follows `config.write_mode`.
    pub fn new(config: &Config, backends: &Backends) -> Self {
        let books: Arc<dyn BookRepository> = Arc::new(CachedBookRepository::new(
            backends.store.clone(),
            backends.cache.clone(),
            config.cache_ttl(),
        ));
        let ledger = Arc::new(idempotency_ledger(config, backends));

        let service = BookService::new(books, ledger);
        let service = match config.write_mode {
            WriteMode::Sync => service,
            WriteMode::Async => {
                service.with_staging(backends.staging.clone(), backends.queue.clone())
            }
        };

        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            service,
            store: backends.store.clone(),
            cache: backends.cache.clone(),
            auth: AuthState::new(config.auth.clone()),
            shutdown_tx,
        }
    }

    /// Subscribe to shutdown signal.
    pub fn subscribe_shutdown(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    /// Signal background tasks to shut down.
    pub fn signal_shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }
}

impl AsRef<AuthState> for AppState {
    fn as_ref(&self) -> &AuthState {
        &self.auth
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use books_core::book::BookInput;
    use books_core::cache::book_key;

    #[tokio::test]
    async fn test_replay_survives_read_cache_pressure() {
        let mut config = Config::for_tests();
        config.cache_max_entries = 3;
        let backends = Backends::in_memory(&config);
        let state = AppState::new(&config, &backends);
        let input = BookInput::new("Clean Code", "Robert C. Martin", 2008);

        let first = state
            .service
            .create_idempotent("k", input.clone())
            .await
            .unwrap();
        for id in 0..10 {
            backends.cache.set(&book_key(id), b"{}", None).await.unwrap();
        }
        let second = state.service.create_idempotent("k", input).await.unwrap();

        assert!(second.replayed);
        assert_eq!(second.book, first.book);
        assert_eq!(state.service.list().await.unwrap().len(), 1);
    }
}
