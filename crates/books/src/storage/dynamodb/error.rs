//! DynamoDB error mapping.
//!
//! Maps AWS SDK errors to `RepositoryError`. Throttling and transport
//! failures become `Unavailable`; anything the table itself refuses is
//! `Failed`.

use std::fmt::Debug;

use aws_sdk_dynamodb::error::SdkError;
use aws_sdk_dynamodb::operation::delete_item::DeleteItemError;
use aws_sdk_dynamodb::operation::get_item::GetItemError;
use aws_sdk_dynamodb::operation::put_item::PutItemError;
use books_core::storage::RepositoryError;

/// Dispatch and timeout failures never reached the service.
fn map_transport<E, R>(err: &SdkError<E, R>) -> Option<RepositoryError> {
    match err {
        SdkError::DispatchFailure(_) | SdkError::TimeoutError(_) => Some(
            RepositoryError::Unavailable("DynamoDB unreachable".to_string()),
        ),
        _ => None,
    }
}

fn throttled() -> RepositoryError {
    RepositoryError::Unavailable("DynamoDB throttled the request".to_string())
}

fn table_missing() -> RepositoryError {
    RepositoryError::Failed("staging table not found".to_string())
}

fn internal() -> RepositoryError {
    RepositoryError::Unavailable("DynamoDB internal server error".to_string())
}

fn get_item_failure(err: GetItemError, id: i64) -> RepositoryError {
    match err {
        GetItemError::ResourceNotFoundException(_) => table_missing(),
        GetItemError::ProvisionedThroughputExceededException(_)
        | GetItemError::RequestLimitExceeded(_) => throttled(),
        GetItemError::InternalServerError(_) => internal(),
        err => RepositoryError::Failed(format!("GetItem book {id}: {err:?}")),
    }
}

fn put_item_failure(err: PutItemError, id: i64) -> RepositoryError {
    match err {
        PutItemError::ConditionalCheckFailedException(_) => RepositoryError::Conflict(id),
        PutItemError::ResourceNotFoundException(_) => table_missing(),
        PutItemError::ProvisionedThroughputExceededException(_)
        | PutItemError::RequestLimitExceeded(_) => throttled(),
        PutItemError::InternalServerError(_) => internal(),
        err => RepositoryError::Failed(format!("PutItem book {id}: {err:?}")),
    }
}

fn delete_item_failure(err: DeleteItemError, id: i64) -> RepositoryError {
    match err {
        DeleteItemError::ResourceNotFoundException(_) => table_missing(),
        DeleteItemError::ProvisionedThroughputExceededException(_)
        | DeleteItemError::RequestLimitExceeded(_) => throttled(),
        DeleteItemError::InternalServerError(_) => internal(),
        err => RepositoryError::Failed(format!("DeleteItem book {id}: {err:?}")),
    }
}

/// Map a GetItem SDK error to RepositoryError.
pub fn map_get_item_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<GetItemError, R>,
    id: i64,
) -> RepositoryError {
    map_transport(&err).unwrap_or_else(|| get_item_failure(err.into_service_error(), id))
}

/// Map a PutItem SDK error to RepositoryError.
pub fn map_put_item_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<PutItemError, R>,
    id: i64,
) -> RepositoryError {
    map_transport(&err).unwrap_or_else(|| put_item_failure(err.into_service_error(), id))
}

/// Map a DeleteItem SDK error to RepositoryError.
pub fn map_delete_item_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<DeleteItemError, R>,
    id: i64,
) -> RepositoryError {
    map_transport(&err).unwrap_or_else(|| delete_item_failure(err.into_service_error(), id))
}
