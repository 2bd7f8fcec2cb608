/// Token issuance and verification.
///
/// `verify_token` only answers "is this a token we signed and is it still
/// alive" — it deliberately does not look at the kind. Callers check the
/// kind afterwards so that a valid refresh token presented where an access
/// token is expected fails with `WrongTokenKind`, not `InvalidToken`.

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::Serialize;

use crate::auth::claims::Claims;
use crate::configuration::JwtSettings;
use crate::error::AppError;

/// The pair returned by register, login and refresh.
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

fn sign(claims: &Claims, config: &JwtSettings) -> Result<String, AppError> {
    encode(
        &Header::new(config.algorithm()?),
        claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Token signing failed: {}", e)))
}

pub fn issue_access_token(
    user_id: i64,
    username: &str,
    config: &JwtSettings,
) -> Result<String, AppError> {
    sign(
        &Claims::access(user_id, username, config.access_token_expiry),
        config,
    )
}

pub fn issue_refresh_token(user_id: i64, config: &JwtSettings) -> Result<String, AppError> {
    sign(&Claims::refresh(user_id, config.refresh_token_expiry), config)
}

pub fn issue_token_pair(
    user_id: i64,
    username: &str,
    config: &JwtSettings,
) -> Result<TokenPair, AppError> {
    Ok(TokenPair {
        access_token: issue_access_token(user_id, username, config)?,
        refresh_token: issue_refresh_token(user_id, config)?,
    })
}

/// Verifies signature and expiry and parses the claims. Kind-agnostic.
///
/// Fails with `InvalidToken` when the signature does not match, the payload
/// does not parse (including a missing `sub` or `exp`), or the token has
/// expired.
pub fn verify_token(token: &str, config: &JwtSettings) -> Result<Claims, AppError> {
    let mut validation = Validation::new(config.algorithm()?);
    validation.set_required_spec_claims(&["exp"]);

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| {
        tracing::warn!("Token verification failed: {}", e);
        AppError::InvalidToken
    })
}
