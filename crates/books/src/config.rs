use std::{env, str::FromStr, time::Duration};

use thiserror::Error;

use books_auth::{AuthConfig, AuthError};
use books_core::idempotency::{DEFAULT_IDEMPOTENCY_TTL_SECONDS, DEFAULT_PENDING_TTL_SECONDS};
use books_core::queue::{DeliveryPolicy, DEFAULT_MAX_RECEIVE_COUNT};

use crate::consumer::ConsumerSettings;
use crate::service::WriteMode;

/// Errors raised while loading configuration. All of them are fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("invalid value for {key}: {value:?} ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
    #[error(transparent)]
    Auth(#[from] AuthError),
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Write path for `POST /books` (default: sync)
    pub write_mode: WriteMode,
    /// Cache TTL in seconds (default: 300)
    pub cache_ttl_seconds: u64,
    /// Maximum number of cache entries (default: 10,000)
    pub cache_max_entries: usize,
    /// Retention of idempotency records in seconds (default: 86,400)
    pub idempotency_ttl_seconds: u64,
    /// Lifetime of a pending idempotency reservation in seconds (default: 15)
    pub idempotency_pending_ttl_seconds: u64,
    /// Path to SQLite database file (default: "books.db")
    /// Note: Only used when the `sqlite` feature is enabled.
    #[allow(dead_code)]
    pub sqlite_path: String,
    /// Redis connection URL (default: "redis://localhost:6379")
    /// Note: Only used when the `redis` feature is enabled.
    #[allow(dead_code)]
    pub redis_url: String,
    /// DynamoDB staging table (default: "Books")
    #[allow(dead_code)]
    pub dynamodb_table_name: String,
    /// SQS queue URL, required with the `aws` feature.
    #[allow(dead_code)]
    pub sqs_queue_url: Option<String>,
    /// Optional SQS dead-letter queue URL.
    #[allow(dead_code)]
    pub sqs_dlq_url: Option<String>,
    /// Messages per receive (default: 10)
    pub consumer_batch_size: usize,
    /// Long-poll wait in seconds (default: 5)
    pub consumer_wait_seconds: u64,
    /// Pause between consumer cycles in milliseconds (default: 1,000)
    pub consumer_poll_interval_ms: u64,
    /// Receives before a failing message is dead-lettered (default: 5)
    pub consumer_max_receive_count: u32,
    /// Visibility timeout of the in-memory queue in seconds (default: 30)
    pub queue_visibility_timeout_seconds: u64,
    pub auth: AuthConfig,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `WRITE_MODE` - `sync` or `async` (default: sync)
    /// - `CACHE_TTL_SECONDS` - Cache TTL in seconds (default: 300)
    /// - `CACHE_MAX_ENTRIES` - Maximum cache entries (default: 10,000)
    /// - `IDEMPOTENCY_TTL_SECONDS` - Idempotency record retention (default: 86,400)
    /// - `IDEMPOTENCY_PENDING_TTL_SECONDS` - Pending reservation lifetime (default: 15)
    /// - `SQLITE_PATH` - SQLite database path (default: "books.db")
    /// - `REDIS_URL` - Redis connection URL (default: "redis://localhost:6379")
    /// - `DYNAMODB_TABLE_NAME` - Staging table name (default: "Books")
    /// - `SQS_QUEUE_URL` - Queue URL (required with the `aws` feature)
    /// - `SQS_DLQ_URL` - Dead-letter queue URL (optional)
    /// - `CONSUMER_BATCH_SIZE`, `CONSUMER_WAIT_SECONDS`, `CONSUMER_POLL_INTERVAL_MS`,
    ///   `CONSUMER_MAX_RECEIVE_COUNT`, `QUEUE_VISIBILITY_TIMEOUT_SECONDS`
    /// - `JWT_SECRET` and friends, see [`AuthConfig::from_env`]
    ///
    /// Unset variables take their default; set but unparsable ones are errors.
    pub fn from_env() -> Result<Self, ConfigError> {
        let auth = AuthConfig::from_env()?;
        Self::from_vars(|key| env::var(key).ok(), auth)
    }

    fn from_vars<F>(var: F, auth: AuthConfig) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let sqs_queue_url = var("SQS_QUEUE_URL").filter(|v| !v.is_empty());

        #[cfg(feature = "aws")]
        if sqs_queue_url.is_none() {
            return Err(ConfigError::Missing("SQS_QUEUE_URL"));
        }

        Ok(Self {
            write_mode: parse(&var, "WRITE_MODE", WriteMode::Sync)?,
            cache_ttl_seconds: parse(&var, "CACHE_TTL_SECONDS", 300)?,
            cache_max_entries: parse(&var, "CACHE_MAX_ENTRIES", 10_000)?,
            idempotency_ttl_seconds: parse(
                &var,
                "IDEMPOTENCY_TTL_SECONDS",
                DEFAULT_IDEMPOTENCY_TTL_SECONDS,
            )?,
            idempotency_pending_ttl_seconds: parse(
                &var,
                "IDEMPOTENCY_PENDING_TTL_SECONDS",
                DEFAULT_PENDING_TTL_SECONDS,
            )?,
            sqlite_path: var("SQLITE_PATH").unwrap_or_else(|| "books.db".to_string()),
            redis_url: var("REDIS_URL").unwrap_or_else(|| "redis://localhost:6379".to_string()),
            dynamodb_table_name: var("DYNAMODB_TABLE_NAME")
                .unwrap_or_else(|| "Books".to_string()),
            sqs_queue_url,
            sqs_dlq_url: var("SQS_DLQ_URL").filter(|v| !v.is_empty()),
            consumer_batch_size: parse(&var, "CONSUMER_BATCH_SIZE", 10)?,
            consumer_wait_seconds: parse(&var, "CONSUMER_WAIT_SECONDS", 5)?,
            consumer_poll_interval_ms: parse(&var, "CONSUMER_POLL_INTERVAL_MS", 1_000)?,
            consumer_max_receive_count: parse(
                &var,
                "CONSUMER_MAX_RECEIVE_COUNT",
                DEFAULT_MAX_RECEIVE_COUNT,
            )?,
            queue_visibility_timeout_seconds: parse(&var, "QUEUE_VISIBILITY_TIMEOUT_SECONDS", 30)?,
            auth,
        })
    }

    /// Get cache TTL as a Duration.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_seconds)
    }

    pub fn idempotency_ttl(&self) -> Duration {
        Duration::from_secs(self.idempotency_ttl_seconds)
    }

    pub fn idempotency_pending_ttl(&self) -> Duration {
        Duration::from_secs(self.idempotency_pending_ttl_seconds)
    }

    pub fn queue_visibility_timeout(&self) -> Duration {
        Duration::from_secs(self.queue_visibility_timeout_seconds)
    }

    /// Settings for the ingestion pipeline.
    pub fn consumer_settings(&self) -> ConsumerSettings {
        ConsumerSettings {
            batch_size: self.consumer_batch_size.max(1),
            wait: Duration::from_secs(self.consumer_wait_seconds),
            poll_interval: Duration::from_millis(self.consumer_poll_interval_ms),
            cache_ttl: self.cache_ttl(),
            policy: DeliveryPolicy::new(self.consumer_max_receive_count),
        }
    }
}

#[cfg(test)]
impl Config {
    /// Defaults with a fixed JWT secret and a placeholder queue URL.
    pub fn for_tests() -> Self {
        let vars = |key: &str| {
            (key == "SQS_QUEUE_URL").then(|| "http://localhost:4566/queue/books".to_string())
        };
        Self::from_vars(vars, AuthConfig::new("test-secret")).unwrap()
    }
}

fn parse<F, T>(var: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match var(key) {
        Some(value) => value.trim().parse().map_err(|err: T::Err| ConfigError::Invalid {
            key,
            reason: err.to_string(),
            value,
        }),
        None => Ok(default),
    }
}
