//! DynamoDB fast-write store.
//!
//! Staged books are single items keyed `PK = SK = BOOK#<id>`, under the id
//! the durable store reserved for them. A conditional put refuses to
//! overwrite an item that is already staged.

mod conversions;
mod error;
mod keys;
mod repository;

pub use repository::DynamoDbStagingRepository;
