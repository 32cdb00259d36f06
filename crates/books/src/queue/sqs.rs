//! Amazon SQS queue.

use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_sqs::error::{DisplayErrorContext, SdkError};
use aws_sdk_sqs::types::{Message, MessageSystemAttributeName};
use aws_sdk_sqs::Client;

use books_core::queue::{MessageQueue, QueueError, QueueMessage, Result};

/// SQS caps a single receive at 10 messages.
const MAX_BATCH: usize = 10;

/// SQS caps long polling at 20 seconds.
const MAX_WAIT_SECONDS: u64 = 20;

/// Maps an SQS SDK error to QueueError.
fn map_sqs_error<E, R>(err: SdkError<E, R>) -> QueueError
where
    E: std::error::Error + 'static,
    R: Debug,
{
    match err {
        SdkError::DispatchFailure(_) | SdkError::TimeoutError(_) => {
            QueueError::ConnectionFailed(DisplayErrorContext(&err).to_string())
        }
        _ => QueueError::OperationFailed(DisplayErrorContext(&err).to_string()),
    }
}

/// Converts a received SQS message. Messages without a receipt handle cannot
/// be acknowledged and are skipped. A missing or unreadable receive count
/// counts as a first delivery.
fn to_queue_message(message: &Message) -> Option<QueueMessage> {
    let receipt = message.receipt_handle()?.to_string();
    let receive_count = message
        .attributes()
        .and_then(|a| a.get(&MessageSystemAttributeName::ApproximateReceiveCount))
        .and_then(|v| v.parse().ok())
        .unwrap_or(1);

    Some(QueueMessage {
        message_id: message.message_id().unwrap_or_default().to_string(),
        body: message.body().unwrap_or_default().to_string(),
        receipt,
        receive_count,
    })
}

/// SQS-backed queue. When `dead_letter_url` is set, dead-lettered messages
/// are copied there before being deleted from the main queue.
pub struct SqsQueue {
    client: Client,
    queue_url: String,
    dead_letter_url: Option<String>,
}

impl SqsQueue {
    pub fn new(
        client: Client,
        queue_url: impl Into<String>,
        dead_letter_url: Option<String>,
    ) -> Self {
        Self {
            client,
            queue_url: queue_url.into(),
            dead_letter_url,
        }
    }

    pub fn queue_url(&self) -> &str {
        &self.queue_url
    }
}

#[async_trait]
impl MessageQueue for SqsQueue {
    async fn enqueue(&self, body: &str) -> Result<String> {
        let output = self
            .client
            .send_message()
            .queue_url(&self.queue_url)
            .message_body(body)
            .send()
            .await
            .map_err(map_sqs_error)?;

        Ok(output.message_id().unwrap_or_default().to_string())
    }

    async fn receive(&self, max_messages: usize, wait: Duration) -> Result<Vec<QueueMessage>> {
        let max = max_messages.clamp(1, MAX_BATCH) as i32;
        let wait_seconds = wait.as_secs().min(MAX_WAIT_SECONDS) as i32;

        let output = self
            .client
            .receive_message()
            .queue_url(&self.queue_url)
            .max_number_of_messages(max)
            .wait_time_seconds(wait_seconds)
            .message_system_attribute_names(MessageSystemAttributeName::ApproximateReceiveCount)
            .send()
            .await
            .map_err(map_sqs_error)?;

        let messages = output
            .messages()
            .iter()
            .filter_map(to_queue_message)
            .collect();

        Ok(messages)
    }

    async fn delete(&self, receipt: &str) -> Result<()> {
        self.client
            .delete_message()
            .queue_url(&self.queue_url)
            .receipt_handle(receipt)
            .send()
            .await
            .map_err(map_sqs_error)?;

        Ok(())
    }

    async fn dead_letter(&self, message: &QueueMessage) -> Result<()> {
        match &self.dead_letter_url {
            Some(url) => {
                self.client
                    .send_message()
                    .queue_url(url)
                    .message_body(&message.body)
                    .send()
                    .await
                    .map_err(map_sqs_error)?;
            }
            None => {
                // Nowhere to park it: keep the payload in the logs.
                tracing::error!(
                    message_id = %message.message_id,
                    body = %message.body,
                    "No dead-letter queue configured, dropping message"
                );
            }
        }

        self.delete(&message.receipt).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_sqs::operation::send_message::SendMessageError;

    #[test]
    fn test_message_carries_receive_count() {
        let message = Message::builder()
            .message_id("m-1")
            .receipt_handle("r-1")
            .body("{}")
            .attributes(MessageSystemAttributeName::ApproximateReceiveCount, "4")
            .build();

        let converted = to_queue_message(&message).unwrap();

        assert_eq!(converted.message_id, "m-1");
        assert_eq!(converted.receipt, "r-1");
        assert_eq!(converted.body, "{}");
        assert_eq!(converted.receive_count, 4);
    }

    #[test]
    fn test_missing_receive_count_is_first_delivery() {
        let message = Message::builder().receipt_handle("r-1").build();

        assert_eq!(to_queue_message(&message).unwrap().receive_count, 1);
    }

    #[test]
    fn test_garbled_receive_count_is_first_delivery() {
        let message = Message::builder()
            .receipt_handle("r-1")
            .attributes(MessageSystemAttributeName::ApproximateReceiveCount, "many")
            .build();

        assert_eq!(to_queue_message(&message).unwrap().receive_count, 1);
    }

    #[test]
    fn test_message_without_receipt_is_skipped() {
        let message = Message::builder().message_id("m-1").body("{}").build();

        assert!(to_queue_message(&message).is_none());
    }

    #[test]
    fn test_timeout_is_connection_failure() {
        let err: SdkError<SendMessageError, ()> =
            SdkError::timeout_error(std::io::Error::other("timed out"));

        assert!(matches!(
            map_sqs_error(err),
            QueueError::ConnectionFailed(_)
        ));
    }

    #[test]
    fn test_construction_failure_is_operation_failure() {
        let err: SdkError<SendMessageError, ()> =
            SdkError::construction_failure(std::io::Error::other("bad input"));

        assert!(matches!(
            map_sqs_error(err),
            QueueError::OperationFailed(_)
        ));
    }
}
