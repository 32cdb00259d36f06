//! DynamoDB attribute conversion functions.
//!
//! Pure functions for converting between DynamoDB AttributeValue maps and
//! books. Testable without DynamoDB access.

use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue;
use books_core::book::Book;
use books_core::storage::RepositoryError;

use super::keys;

pub const ENTITY_TYPE_BOOK: &str = "BOOK";

/// Convert a Book to DynamoDB item.
pub fn book_to_item(book: &Book) -> HashMap<String, AttributeValue> {
    let mut item = HashMap::new();

    // Keys
    item.insert("PK".to_string(), AttributeValue::S(keys::book_pk(book.id)));
    item.insert("SK".to_string(), AttributeValue::S(keys::book_sk(book.id)));

    // Entity type
    item.insert(
        "entityType".to_string(),
        AttributeValue::S(ENTITY_TYPE_BOOK.to_string()),
    );

    // Data
    item.insert("id".to_string(), AttributeValue::N(book.id.to_string()));
    item.insert("title".to_string(), AttributeValue::S(book.title.clone()));
    item.insert("author".to_string(), AttributeValue::S(book.author.clone()));
    item.insert("year".to_string(), AttributeValue::N(book.year.to_string()));

    item
}

/// Convert a DynamoDB item to Book.
pub fn item_to_book(item: &HashMap<String, AttributeValue>) -> Result<Book, RepositoryError> {
    Ok(Book {
        id: get_number(item, "id")?,
        title: get_string(item, "title")?,
        author: get_string(item, "author")?,
        year: get_number(item, "year")?,
    })
}

// ============================================================================
// Helper functions
// ============================================================================

/// Get a required string attribute.
fn get_string(
    item: &HashMap<String, AttributeValue>,
    key: &str,
) -> Result<String, RepositoryError> {
    item.get(key)
        .and_then(|v| v.as_s().ok())
        .map(|s| s.to_string())
        .ok_or_else(|| RepositoryError::Corrupt(format!("missing or invalid field: {key}")))
}

/// Get a required numeric attribute.
fn get_number<T: std::str::FromStr>(
    item: &HashMap<String, AttributeValue>,
    key: &str,
) -> Result<T, RepositoryError> {
    let raw = item
        .get(key)
        .and_then(|v| v.as_n().ok())
        .ok_or_else(|| RepositoryError::Corrupt(format!("missing or invalid field: {key}")))?;
    raw.parse()
        .map_err(|_| RepositoryError::Corrupt(format!("invalid number {key}: {raw}")))
}
