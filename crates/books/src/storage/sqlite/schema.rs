//! SQLite schema definitions and SQL query constants.
//!
//! Pure data, no I/O.

/// SQL statement to create all tables.
///
/// Every id comes from `book_ids`, whether the book is written right away or
/// staged first. `AUTOINCREMENT` keeps ids from being reused after a delete.
pub const CREATE_TABLES: &str = r#"
CREATE TABLE IF NOT EXISTS books (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    author TEXT NOT NULL,
    year INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS book_ids (
    id INTEGER PRIMARY KEY AUTOINCREMENT
);
"#;

/// Moves the id sequence past rows written before `book_ids` existed.
pub const SEED_BOOK_IDS: &str = r#"
INSERT INTO book_ids (id)
SELECT max_id FROM (SELECT MAX(id) AS max_id FROM books)
WHERE max_id > COALESCE((SELECT seq FROM sqlite_sequence WHERE name = 'book_ids'), 0)
"#;

pub const RESERVE_BOOK_ID: &str = r#"
INSERT INTO book_ids DEFAULT VALUES
"#;

/// Moves the id sequence past `?1` when a book arrives with a larger id.
pub const ADVANCE_BOOK_ID: &str = r#"
INSERT INTO book_ids (id)
SELECT ?1
WHERE ?1 > COALESCE((SELECT seq FROM sqlite_sequence WHERE name = 'book_ids'), 0)
"#;

/// Only the sequence matters; older rows are dropped.
pub const PRUNE_BOOK_IDS: &str = r#"
DELETE FROM book_ids
WHERE id < ?1
"#;

pub const INSERT_BOOK: &str = r#"
INSERT INTO books (id, title, author, year)
VALUES (?1, ?2, ?3, ?4)
ON CONFLICT(id) DO NOTHING
"#;

pub const UPSERT_BOOK: &str = r#"
INSERT INTO books (id, title, author, year)
VALUES (?1, ?2, ?3, ?4)
ON CONFLICT(id) DO UPDATE SET
    title = excluded.title,
    author = excluded.author,
    year = excluded.year
"#;

pub const SELECT_BOOK_BY_ID: &str = r#"
SELECT id, title, author, year
FROM books
WHERE id = ?1
"#;

pub const SELECT_ALL_BOOKS: &str = r#"
SELECT id, title, author, year
FROM books
ORDER BY id ASC
"#;

pub const UPDATE_BOOK: &str = r#"
UPDATE books
SET title = ?2, author = ?3, year = ?4
WHERE id = ?1
"#;

pub const DELETE_BOOK: &str = r#"
DELETE FROM books
WHERE id = ?1
"#;
