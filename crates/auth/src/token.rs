//! HS256 token issuance and validation.

use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::{config::AuthConfig, error::AuthError};

/// Claims carried by an access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// The username that logged in.
    pub sub: String,
    pub iss: String,
    pub aud: String,
    /// Issued at (seconds since epoch).
    pub iat: i64,
    /// Expires at (seconds since epoch).
    pub exp: i64,
}

impl Claims {
    /// Builds the claims for `username` issued at `now`.
    pub fn for_user(config: &AuthConfig, username: &str, now: DateTime<Utc>) -> Self {
        let ttl = chrono::Duration::from_std(config.token_ttl)
            .unwrap_or_else(|_| chrono::Duration::minutes(60));

        Self {
            sub: username.to_string(),
            iss: config.issuer.clone(),
            aud: config.audience.clone(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        }
    }
}

/// Signs a token for `username`.
pub fn issue_token(
    config: &AuthConfig,
    username: &str,
    now: DateTime<Utc>,
) -> Result<String, AuthError> {
    let claims = Claims::for_user(config, username, now);

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| AuthError::Encoding(e.to_string()))
}

/// Validates signature, issuer, audience and expiry.
pub fn validate_token(config: &AuthConfig, token: &str) -> Result<Claims, AuthError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[&config.issuer]);
    validation.set_audience(&[&config.audience]);
    validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| AuthError::InvalidToken(e.to_string()))
}
