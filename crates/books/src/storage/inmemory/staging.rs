//! In-memory fast-write store.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use books_core::book::Book;
use books_core::storage::{RepositoryError, Result, StagingRepository};

/// Holds staged books until the ingestion pipeline confirms them.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStagingRepository {
    books: Arc<RwLock<HashMap<i64, Book>>>,
}

impl InMemoryStagingRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of books still waiting for confirmation.
    pub async fn len(&self) -> usize {
        self.books.read().await.len()
    }
}

#[async_trait]
impl StagingRepository for InMemoryStagingRepository {
    async fn stage_book(&self, book: &Book) -> Result<()> {
        if !book.has_id() {
            return Err(RepositoryError::Rejected(format!(
                "cannot stage book without id: {}",
                book.id
            )));
        }

        let mut books = self.books.write().await;
        if books.contains_key(&book.id) {
            return Err(RepositoryError::Conflict(book.id));
        }
        books.insert(book.id, book.clone());
        Ok(())
    }

    async fn get_staged(&self, id: i64) -> Result<Option<Book>> {
        Ok(self.books.read().await.get(&id).cloned())
    }

    async fn remove_staged(&self, id: i64) -> Result<()> {
        self.books.write().await.remove(&id);
        Ok(())
    }
}
