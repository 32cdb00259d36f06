//! Wire format of book events carried by the queue.
//!
//! Publishers send either an envelope `{"Action": "Created", "Book": {..}}`
//! or a bare book. A bare book is read as a `Created` event.

use serde::{Deserialize, Serialize};

use crate::book::Book;

use super::{QueueError, Result};

/// What happened to the book carried by an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BookAction {
    Created,
    Updated,
    Deleted,
}

/// A book event as it travels through the queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookEvent {
    #[serde(rename = "Action", alias = "action")]
    pub action: BookAction,
    #[serde(rename = "Book", alias = "book")]
    pub book: Book,
}

impl BookEvent {
    pub fn created(book: Book) -> Self {
        Self {
            action: BookAction::Created,
            book,
        }
    }

    pub fn updated(book: Book) -> Self {
        Self {
            action: BookAction::Updated,
            book,
        }
    }

    pub fn deleted(book: Book) -> Self {
        Self {
            action: BookAction::Deleted,
            book,
        }
    }
}

/// Serializes an event into a queue message body.
pub fn encode_event(event: &BookEvent) -> Result<String> {
    serde_json::to_string(event).map_err(|e| QueueError::Malformed(e.to_string()))
}

/// Decodes a queue message body.
///
/// Fails with [`QueueError::Malformed`] when the body is neither an envelope
/// nor a bare book, or when the book carries no id.
pub fn decode_payload(body: &str) -> Result<BookEvent> {
    let event = match serde_json::from_str::<BookEvent>(body) {
        Ok(event) => event,
        Err(envelope_err) => match serde_json::from_str::<Book>(body) {
            Ok(book) => BookEvent::created(book),
            Err(_) => return Err(QueueError::Malformed(envelope_err.to_string())),
        },
    };

    if !event.book.has_id() {
        return Err(QueueError::Malformed(format!(
            "book has no id: {}",
            event.book.id
        )));
    }

    Ok(event)
}
