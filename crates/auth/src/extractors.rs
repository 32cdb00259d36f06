//! Axum extractors for authentication.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::{error::AuthError, token::validate_token, AuthState, Claims};

/// Extractor for an authenticated caller. Rejects with 401 when the
/// `Authorization: Bearer <token>` header is missing or the token is invalid.
pub struct CurrentUser(pub Claims);

impl CurrentUser {
    pub fn username(&self) -> &str {
        &self.0.sub
    }
}

impl<S> FromRequestParts<S> for CurrentUser
where
    AuthState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth_state = AuthState::from_ref(state);

        let header_value = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or(AuthError::MissingToken)?
            .to_str()
            .map_err(|_| AuthError::InvalidToken("invalid authorization header".to_string()))?;

        let token = header_value
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::MissingToken)?;

        let claims = validate_token(&auth_state.config, token)?;

        Ok(CurrentUser(claims))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{issue_token, AuthConfig};
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        routing::get,
        Router,
    };
    use chrono::Utc;
    use tower::ServiceExt;

    async fn whoami(user: CurrentUser) -> String {
        user.username().to_string()
    }

    fn app() -> (Router, AuthState) {
        let state = AuthState::new(AuthConfig::new("extractor-secret"));
        let router = Router::new()
            .route("/whoami", get(whoami))
            .with_state(state.clone());
        (router, state)
    }

    #[tokio::test]
    async fn test_valid_token_is_accepted() {
        let (app, state) = app();
        let token = issue_token(&state.config, "bob", Utc::now()).unwrap();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/whoami")
                    .header("Authorization", format!("Bearer {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_missing_header_is_unauthorized() {
        let (app, _) = app();

        let response = app
            .oneshot(Request::builder().uri("/whoami").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_non_bearer_scheme_is_unauthorized() {
        let (app, _) = app();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/whoami")
                    .header("Authorization", "Basic Ym9iOjEyMw==")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_tampered_token_is_unauthorized() {
        let (app, state) = app();
        let token = issue_token(&state.config, "bob", Utc::now()).unwrap();
        let tampered = format!("{token}x");

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/whoami")
                    .header("Authorization", format!("Bearer {tampered}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
