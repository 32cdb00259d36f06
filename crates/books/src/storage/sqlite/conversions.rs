//! SQLite row conversion functions.

use books_core::book::Book;
use rusqlite::Row;

/// Convert a SQLite row to a Book.
///
/// Expected columns: id, title, author, year
pub fn row_to_book(row: &Row) -> rusqlite::Result<Book> {
    Ok(Book {
        id: row.get(0)?,
        title: row.get(1)?,
        author: row.get(2)?,
        year: row.get(3)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_to_book() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();

        let book = conn
            .query_row(
                "SELECT 3, 'Dune', 'Frank Herbert', 1965",
                [],
                row_to_book,
            )
            .unwrap();

        assert_eq!(book, Book::new("Dune", "Frank Herbert", 1965).with_id(3));
    }

    #[test]
    fn test_row_with_wrong_type_fails() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();

        let result = conn.query_row("SELECT 'x', 'T', 'A', 1", [], row_to_book);

        assert!(result.is_err());
    }
}
