//! DynamoDB staging repository implementation.

use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client;

use books_core::book::Book;
use books_core::storage::{RepositoryError, Result, StagingRepository};

use super::conversions::{book_to_item, item_to_book};
use super::error::{map_delete_item_error, map_get_item_error, map_put_item_error};
use super::keys;

/// Fast-write store backed by a DynamoDB table with `PK`/`SK` string keys.
pub struct DynamoDbStagingRepository {
    client: Client,
    table_name: String,
}

impl DynamoDbStagingRepository {
    /// Creates a new repository with the given DynamoDB client and table name.
    pub fn new(client: Client, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
        }
    }

    /// Get the table name.
    pub fn table_name(&self) -> &str {
        &self.table_name
    }
}

#[async_trait]
impl StagingRepository for DynamoDbStagingRepository {
    async fn stage_book(&self, book: &Book) -> Result<()> {
        if !book.has_id() {
            return Err(RepositoryError::Rejected(format!(
                "cannot stage book without id: {}",
                book.id
            )));
        }

        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(book_to_item(book)))
            .condition_expression("attribute_not_exists(PK)")
            .send()
            .await
            .map_err(|e| map_put_item_error(e, book.id))?;

        tracing::debug!(book_id = book.id, table = %self.table_name, "Staged book");
        Ok(())
    }

    async fn get_staged(&self, id: i64) -> Result<Option<Book>> {
        let result = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key("PK", AttributeValue::S(keys::book_pk(id)))
            .key("SK", AttributeValue::S(keys::book_sk(id)))
            .consistent_read(true)
            .send()
            .await
            .map_err(|e| map_get_item_error(e, id))?;

        match result.item {
            Some(item) => Ok(Some(item_to_book(&item)?)),
            None => Ok(None),
        }
    }

    async fn remove_staged(&self, id: i64) -> Result<()> {
        self.client
            .delete_item()
            .table_name(&self.table_name)
            .key("PK", AttributeValue::S(keys::book_pk(id)))
            .key("SK", AttributeValue::S(keys::book_sk(id)))
            .send()
            .await
            .map_err(|e| map_delete_item_error(e, id))?;

        Ok(())
    }
}
