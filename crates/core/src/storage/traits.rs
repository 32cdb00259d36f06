use async_trait::async_trait;

use crate::book::{Book, BookInput};

use super::Result;

/// The durable store: system of record for books, and the only place ids
/// come from.
#[async_trait]
pub trait BookRepository: Send + Sync {
    /// Lists every book, ordered by id.
    async fn list_books(&self) -> Result<Vec<Book>>;

    /// Gets a book by its id.
    async fn get_book(&self, id: i64) -> Result<Option<Book>>;

    /// Hands out an id that no existing or future row will take, without
    /// writing a book. Staged creates use it so the staged copy can later
    /// be inserted under the same id.
    async fn reserve_id(&self) -> Result<i64>;

    /// Creates a book, letting the store assign its id.
    async fn create_book(&self, input: &BookInput) -> Result<Book>;

    /// Inserts the book under its existing id. Returns false, leaving the
    /// stored row untouched, when the id is already taken.
    async fn insert_book(&self, book: &Book) -> Result<bool>;

    /// Inserts the book with its existing id, or overwrites the row if one
    /// already exists.
    async fn upsert_book(&self, book: &Book) -> Result<()>;

    /// Overwrites every field of an existing book.
    ///
    /// Fails with `NotFound` when no row has the book's id.
    async fn update_book(&self, book: &Book) -> Result<()>;

    /// Deletes a book. Returns false when there was nothing to delete.
    async fn delete_book(&self, id: i64) -> Result<bool>;
}

/// The fast-write store holding books that are not yet confirmed into the
/// durable store.
#[async_trait]
pub trait StagingRepository: Send + Sync {
    /// Stages a book under the id it already carries.
    async fn stage_book(&self, book: &Book) -> Result<()>;

    /// Gets a staged book by id.
    async fn get_staged(&self, id: i64) -> Result<Option<Book>>;

    /// Removes a staged book once it has been confirmed.
    async fn remove_staged(&self, id: i64) -> Result<()>;
}
