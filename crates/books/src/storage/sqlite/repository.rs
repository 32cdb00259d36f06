//! SQLite repository implementation.

use async_trait::async_trait;
use tokio_rusqlite::Connection;

use books_core::book::{Book, BookInput};
use books_core::storage::{BookRepository, RepositoryError, Result};

use super::conversions::row_to_book;
use super::error::map_tokio_rusqlite_error;
use super::schema;

/// Helper to wrap rusqlite errors for tokio_rusqlite closures.
fn wrap_err(e: rusqlite::Error) -> tokio_rusqlite::Error {
    tokio_rusqlite::Error::Rusqlite(e)
}

/// Takes the next id from the `book_ids` sequence.
fn next_id(conn: &rusqlite::Connection) -> rusqlite::Result<i64> {
    conn.execute(schema::RESERVE_BOOK_ID, [])?;
    let id = conn.last_insert_rowid();
    conn.execute(schema::PRUNE_BOOK_IDS, [id])?;
    Ok(id)
}

fn require_id(book: &Book) -> Result<()> {
    if book.has_id() {
        Ok(())
    } else {
        Err(RepositoryError::Rejected(format!("book without id: {}", book.id)))
    }
}

/// SQLite-backed durable store.
pub struct SqliteBookRepository {
    conn: Connection,
}

impl SqliteBookRepository {
    /// Opens (or creates) the database file and ensures the schema exists.
    pub async fn new(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .await
            .map_err(|e| RepositoryError::Unavailable(e.to_string()))?;

        Self::init_schema(&conn).await?;

        Ok(Self { conn })
    }

    /// Creates a repository over a private in-memory database.
    pub async fn new_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| RepositoryError::Unavailable(e.to_string()))?;

        Self::init_schema(&conn).await?;

        Ok(Self { conn })
    }

    async fn init_schema(conn: &Connection) -> Result<()> {
        conn.call(|conn| {
            conn.execute_batch(schema::CREATE_TABLES)
                .map_err(wrap_err)?;
            conn.execute(schema::SEED_BOOK_IDS, []).map_err(wrap_err)?;
            Ok(())
        })
        .await
        .map_err(|e| map_tokio_rusqlite_error(e, None))
    }

    /// Writes `book` with `statement` and moves the id sequence past it, in
    /// one transaction. Returns the number of rows written.
    async fn write_with_id(&self, statement: &'static str, book: &Book) -> Result<usize> {
        require_id(book)?;

        let book = book.clone();
        let id = book.id;

        self.conn
            .call(move |conn| {
                let tx = conn.transaction().map_err(wrap_err)?;
                let rows = tx
                    .execute(
                        statement,
                        rusqlite::params![book.id, book.title, book.author, book.year],
                    )
                    .map_err(wrap_err)?;
                tx.execute(schema::ADVANCE_BOOK_ID, [book.id])
                    .map_err(wrap_err)?;
                tx.commit().map_err(wrap_err)?;
                Ok(rows)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, Some(id)))
    }
}

#[async_trait]
impl BookRepository for SqliteBookRepository {
    async fn list_books(&self) -> Result<Vec<Book>> {
        self.conn
            .call(|conn| {
                let mut stmt = conn.prepare(schema::SELECT_ALL_BOOKS).map_err(wrap_err)?;
                let rows = stmt.query_map([], row_to_book).map_err(wrap_err)?;

                let mut books = Vec::new();
                for row_result in rows {
                    books.push(row_result.map_err(wrap_err)?);
                }
                Ok(books)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, None))
    }

    async fn get_book(&self, id: i64) -> Result<Option<Book>> {
        self.conn
            .call(move |conn| {
                let mut stmt = conn.prepare(schema::SELECT_BOOK_BY_ID).map_err(wrap_err)?;
                match stmt.query_row([id], row_to_book) {
                    Ok(book) => Ok(Some(book)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(wrap_err(e)),
                }
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, Some(id)))
    }

    async fn reserve_id(&self) -> Result<i64> {
        self.conn
            .call(|conn| next_id(conn).map_err(wrap_err))
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, None))
    }

    async fn create_book(&self, input: &BookInput) -> Result<Book> {
        let input = input.clone();

        self.conn
            .call(move |conn| {
                let tx = conn.transaction().map_err(wrap_err)?;
                let book = input.into_book(next_id(&tx).map_err(wrap_err)?);
                tx.execute(
                    schema::INSERT_BOOK,
                    rusqlite::params![book.id, book.title, book.author, book.year],
                )
                .map_err(wrap_err)?;
                tx.commit().map_err(wrap_err)?;
                Ok(book)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, None))
    }

    async fn insert_book(&self, book: &Book) -> Result<bool> {
        let rows = self.write_with_id(schema::INSERT_BOOK, book).await?;
        Ok(rows > 0)
    }

    async fn upsert_book(&self, book: &Book) -> Result<()> {
        self.write_with_id(schema::UPSERT_BOOK, book).await?;
        Ok(())
    }

    async fn update_book(&self, book: &Book) -> Result<()> {
        let book = book.clone();
        let id = book.id;

        self.conn
            .call(move |conn| {
                let rows = conn
                    .execute(
                        schema::UPDATE_BOOK,
                        rusqlite::params![book.id, book.title, book.author, book.year],
                    )
                    .map_err(wrap_err)?;
                if rows == 0 {
                    Err(wrap_err(rusqlite::Error::QueryReturnedNoRows))
                } else {
                    Ok(())
                }
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, Some(id)))
    }

    async fn delete_book(&self, id: i64) -> Result<bool> {
        self.conn
            .call(move |conn| {
                let rows = conn.execute(schema::DELETE_BOOK, [id]).map_err(wrap_err)?;
                Ok(rows > 0)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, Some(id)))
    }
}
