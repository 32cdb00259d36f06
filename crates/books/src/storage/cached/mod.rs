//! Cached repository decorator.
//!
//! Wraps a `BookRepository` with the cache-aside pattern:
//!
//! - **Reads**: Check cache first, on miss fetch from repository and populate cache
//! - **Writes**: Persist to repository, drop `books_all`, refresh or drop `book_{id}`
//!
//! The cache steps are also exported on their own so the ingestion pipeline
//! can apply the same invalidation after confirming a staged book.

mod book;

pub use book::{evict_book, refresh_book, CachedBookRepository};
