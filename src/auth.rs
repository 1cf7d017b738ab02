//! Actor identity extraction.
//!
//! Token issuance and session management belong to the external identity
//! provider; this module only verifies the bearer token it hands out and
//! exposes the authenticated actor id to handlers. Every mutating row is
//! attributed to that id.

use crate::{errors::ServiceError, AppState};
use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Actor id (UUID) issued by the identity provider
    pub sub: String,
    /// Expiry, seconds since epoch
    pub exp: i64,
    /// Issued-at, seconds since epoch
    pub iat: i64,
}

/// The authenticated actor attributed to mutating operations.
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUser {
    pub id: Uuid,
}

/// Verifies an HS256 bearer token and returns its claims.
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, ServiceError> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map_err(|e| ServiceError::Unauthorized(format!("Invalid token: {e}")))?;

    Ok(data.claims)
}

/// Issues a short-lived HS256 token for the given actor. Used by tests and
/// local tooling; production tokens come from the identity provider.
pub fn issue_token(user_id: Uuid, secret: &str, ttl_secs: i64) -> Result<String, ServiceError> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id.to_string(),
        exp: (now + Duration::seconds(ttl_secs)).timestamp(),
        iat: now.timestamp(),
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| ServiceError::InternalError(format!("Failed to sign token: {e}")))
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app = AppState::from_ref(state);

        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ServiceError::Unauthorized("Missing authorization header".into()))?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| ServiceError::Unauthorized("Expected bearer token".into()))?;

        let claims = verify_token(token, &app.config.jwt_secret)?;
        let id = Uuid::parse_str(&claims.sub)
            .map_err(|_| ServiceError::Unauthorized("Token subject is not a valid id".into()))?;

        Ok(AuthenticatedUser { id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    const SECRET: &str = "test-secret";

    #[test]
    fn token_roundtrip_preserves_actor_id() {
        let actor = Uuid::new_v4();
        let token = issue_token(actor, SECRET, 60).unwrap();
        let claims = verify_token(&token, SECRET).unwrap();
        assert_eq!(claims.sub, actor.to_string());
    }

    #[test]
    fn expired_token_is_rejected() {
        let token = issue_token(Uuid::new_v4(), SECRET, -120).unwrap();
        assert_matches!(
            verify_token(&token, SECRET),
            Err(ServiceError::Unauthorized(_))
        );
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = issue_token(Uuid::new_v4(), SECRET, 60).unwrap();
        assert_matches!(
            verify_token(&token, "other-secret"),
            Err(ServiceError::Unauthorized(_))
        );
    }
}
