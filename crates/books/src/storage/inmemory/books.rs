//! In-memory durable store.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use books_core::book::{Book, BookInput};
use books_core::storage::{BookRepository, RepositoryError, Result};

#[derive(Debug, Default)]
struct Table {
    rows: BTreeMap<i64, Book>,
    /// Highest id ever handed out or written; ids are never reused.
    last_id: i64,
}

impl Table {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }
}

fn require_id(book: &Book) -> Result<()> {
    if book.has_id() {
        Ok(())
    } else {
        Err(RepositoryError::Rejected(format!("book without id: {}", book.id)))
    }
}

/// In-memory book table with autoincrement ids.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBookRepository {
    table: Arc<RwLock<Table>>,
}

impl InMemoryBookRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BookRepository for InMemoryBookRepository {
    async fn list_books(&self) -> Result<Vec<Book>> {
        let table = self.table.read().await;
        Ok(table.rows.values().cloned().collect())
    }

    async fn get_book(&self, id: i64) -> Result<Option<Book>> {
        let table = self.table.read().await;
        Ok(table.rows.get(&id).cloned())
    }

    async fn reserve_id(&self) -> Result<i64> {
        Ok(self.table.write().await.next_id())
    }

    async fn create_book(&self, input: &BookInput) -> Result<Book> {
        let mut table = self.table.write().await;
        let book = input.clone().into_book(table.next_id());
        table.rows.insert(book.id, book.clone());
        Ok(book)
    }

    async fn insert_book(&self, book: &Book) -> Result<bool> {
        require_id(book)?;

        let mut table = self.table.write().await;
        if table.rows.contains_key(&book.id) {
            return Ok(false);
        }
        table.last_id = table.last_id.max(book.id);
        table.rows.insert(book.id, book.clone());
        Ok(true)
    }

    async fn upsert_book(&self, book: &Book) -> Result<()> {
        require_id(book)?;

        let mut table = self.table.write().await;
        table.last_id = table.last_id.max(book.id);
        table.rows.insert(book.id, book.clone());
        Ok(())
    }

    async fn update_book(&self, book: &Book) -> Result<()> {
        let mut table = self.table.write().await;
        match table.rows.get_mut(&book.id) {
            Some(row) => {
                *row = book.clone();
                Ok(())
            }
            None => Err(RepositoryError::NotFound(book.id)),
        }
    }

    async fn delete_book(&self, id: i64) -> Result<bool> {
        let mut table = self.table.write().await;
        Ok(table.rows.remove(&id).is_some())
    }
}
