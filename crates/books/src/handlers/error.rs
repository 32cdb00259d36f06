use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use books_core::cache::CacheError;
use books_core::idempotency::IdempotencyError;
use books_core::queue::QueueError;
use books_core::storage::RepositoryError;

use crate::service::ServiceError;

/// Handler error wrapping `anyhow::Error`.
///
/// Known error types are downcast and mapped to their status codes; anything
/// else is a 500.
pub struct AppError(pub anyhow::Error);

impl AppError {
    /// 400 with a list of client-facing messages.
    pub fn bad_request(messages: Vec<String>) -> Response {
        (StatusCode::BAD_REQUEST, Json(json!({ "errors": messages }))).into_response()
    }
}

fn repository_status(error: &RepositoryError) -> StatusCode {
    StatusCode::from_u16(error.status_code())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

fn service_status(error: &ServiceError) -> StatusCode {
    match error {
        ServiceError::Validation(_) | ServiceError::Mismatch(_) => StatusCode::BAD_REQUEST,
        ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
        ServiceError::Repository(err) => repository_status(err),
        ServiceError::Queue(QueueError::ConnectionFailed(_))
        | ServiceError::Idempotency(IdempotencyError::Cache(CacheError::ConnectionFailed(_))) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        ServiceError::Idempotency(IdempotencyError::InProgress(_)) => StatusCode::CONFLICT,
        ServiceError::Queue(_) | ServiceError::Idempotency(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let Some(service_error) = self.0.downcast_ref::<ServiceError>() {
            if let Some(messages) = service_error.client_messages() {
                return Self::bad_request(messages);
            }

            let status = service_status(service_error);
            if status == StatusCode::NOT_FOUND {
                return status.into_response();
            }
            if status == StatusCode::CONFLICT {
                return (status, Json(json!({ "errors": [service_error.to_string()] })))
                    .into_response();
            }
            if status.is_server_error() {
                tracing::error!(error = %service_error, "Request failed");
            }
            return (status, service_error.to_string()).into_response();
        }

        let status_code = match self.0.downcast_ref::<RepositoryError>() {
            Some(repo_error) => repository_status(repo_error),
            None => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status_code.is_server_error() {
            tracing::error!(error = %self.0, "Request failed");
        }

        (status_code, self.0.to_string()).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
