use axum::http::HeaderMap;
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Driver,
    Admin,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Entity id the credential was issued for.
    pub sub: String,
    pub role: Role,
    pub exp: i64,
    pub iat: i64,
}

/// Mints an HS256 bearer token. Issuance lives in an external credential
/// service in production; this is the same shape, used by tests and tooling.
pub fn mint_token(
    subject: Uuid,
    role: Role,
    secret: &str,
    valid_for: Duration,
) -> Result<String, AppError> {
    let now = Utc::now();
    let claims = Claims {
        sub: subject.to_string(),
        role,
        exp: (now + valid_for).timestamp(),
        iat: now.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|err| AppError::Internal(format!("failed to mint token: {err}")))
}

/// Verifies the bearer credential on a mutating request: the token must be
/// valid and unexpired, carry `required_role`, and have been issued for
/// `expected_subject`. The same uniform rejection is returned for every
/// failure mode so callers cannot probe which check tripped.
pub fn authorize(
    headers: &HeaderMap,
    required_role: Role,
    expected_subject: Uuid,
    secret: &str,
) -> Result<Claims, AppError> {
    let claims = verify_bearer(headers, secret)?;

    if claims.role != required_role || claims.sub != expected_subject.to_string() {
        return Err(AppError::Unauthorized("access denied".to_string()));
    }

    Ok(claims)
}

/// Role check without a subject binding, for endpoints any holder of the role
/// may call (e.g. admin fleet management).
pub fn authorize_role(
    headers: &HeaderMap,
    required_role: Role,
    secret: &str,
) -> Result<Claims, AppError> {
    let claims = verify_bearer(headers, secret)?;

    if claims.role != required_role {
        return Err(AppError::Unauthorized("access denied".to_string()));
    }

    Ok(claims)
}

fn verify_bearer(headers: &HeaderMap, secret: &str) -> Result<Claims, AppError> {
    let header = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("missing bearer token".to_string()))?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Unauthorized("missing bearer token".to_string()))?;

    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::Unauthorized("invalid or expired token".to_string()))?;

    Ok(data.claims)
}
