use serde::{Deserialize, Serialize};

/// A book record.
///
/// `id` is assigned by whichever store accepts the first write (the durable
/// store in the synchronous path, the staging store in the asynchronous one)
/// and never changes afterwards. An `id` of 0 means "not assigned yet".
///
/// Deserialization also accepts PascalCase field names so payloads produced
/// by other publishers (`{"Id":1,"Title":..}`) can be ingested.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Book {
    #[serde(default, alias = "Id")]
    pub id: i64,
    #[serde(alias = "Title")]
    pub title: String,
    #[serde(alias = "Author")]
    pub author: String,
    #[serde(default, alias = "Year")]
    pub year: i32,
}

impl Book {
    /// Creates a book without an assigned id.
    pub fn new(title: impl Into<String>, author: impl Into<String>, year: i32) -> Self {
        Self {
            id: 0,
            title: title.into(),
            author: author.into(),
            year,
        }
    }

    /// Sets a specific id (useful for stores and tests).
    pub fn with_id(mut self, id: i64) -> Self {
        self.id = id;
        self
    }

    /// Returns true once a store has assigned an id.
    pub fn has_id(&self) -> bool {
        self.id > 0
    }
}
