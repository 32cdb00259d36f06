//! Request payloads accepted by the book endpoints.

use serde::{Deserialize, Serialize};

use super::Book;

/// Payload for creating a book. Any `id` sent by the client is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookInput {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub year: i32,
}

impl BookInput {
    pub fn new(title: impl Into<String>, author: impl Into<String>, year: i32) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            year,
        }
    }

    /// Builds the book a store will persist once it has picked an id.
    pub fn into_book(self, id: i64) -> Book {
        Book {
            id,
            title: self.title,
            author: self.author,
            year: self.year,
        }
    }
}

impl From<&Book> for BookInput {
    fn from(book: &Book) -> Self {
        Self {
            title: book.title.clone(),
            author: book.author.clone(),
            year: book.year,
        }
    }
}

/// Payload for a full replacement of an existing book.
///
/// `id` must agree with the id in the request path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateBook {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub year: i32,
}

impl UpdateBook {
    pub fn into_book(self) -> Book {
        Book {
            id: self.id,
            title: self.title,
            author: self.author,
            year: self.year,
        }
    }
}
