//! Storage backend implementations.
//!
//! Concrete implementations of the repository traits defined in
//! `books_core::storage`. The in-memory backends are always compiled; the
//! others are selected at compile time via feature flags.
//!
//! # Feature Flags
//!
//! - `sqlite`: SQLite durable store using `rusqlite` and `tokio-rusqlite`
//! - `aws`: DynamoDB fast-write store using `aws-sdk-dynamodb`
//!
//! # Examples
//!
//! Build with SQLite and the AWS backends:
//! ```bash
//! cargo build -p books --features sqlite,aws
//! ```

pub mod cached;
pub mod inmemory;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "aws")]
pub mod dynamodb;

pub use cached::CachedBookRepository;
pub use inmemory::{InMemoryBookRepository, InMemoryStagingRepository};

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteBookRepository;

#[cfg(feature = "aws")]
pub use dynamodb::DynamoDbStagingRepository;
