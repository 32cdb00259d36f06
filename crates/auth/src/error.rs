use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

/// Auth errors for the books_auth crate.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No bearer token on the request.
    #[error("missing bearer token")]
    MissingToken,

    /// The token failed signature, issuer, audience or expiry checks.
    #[error("invalid token: {0}")]
    InvalidToken(String),

    /// Login attempted with a wrong password.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Token could not be signed.
    #[error("token encoding failed: {0}")]
    Encoding(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AuthError::MissingToken | AuthError::InvalidToken(_) => {
                tracing::debug!(error = %self, "Rejected request");
                (StatusCode::UNAUTHORIZED, self.to_string())
            }
            AuthError::InvalidCredentials => (StatusCode::UNAUTHORIZED, self.to_string()),
            AuthError::Encoding(_) | AuthError::Config(_) => {
                tracing::error!("Auth error: {}", self);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AuthError::MissingToken.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::InvalidToken("bad signature".to_string())
                .into_response()
                .status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::InvalidCredentials.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::Encoding("boom".to_string())
                .into_response()
                .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
