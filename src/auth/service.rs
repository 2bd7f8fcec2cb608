/// Session orchestration: registration, login, refresh, logout.
///
/// Each method is one all-or-nothing transaction. On any error the
/// transaction is dropped and rolls back; the store is only mutated on the
/// success path.

use serde::Deserialize;
use sqlx::PgPool;

use crate::auth::claims::{Claims, TokenKind};
use crate::auth::jwt::{issue_token_pair, verify_token, TokenPair};
use crate::auth::password::{hash_password, verify_password};
use crate::auth::token_store;
use crate::configuration::JwtSettings;
use crate::error::AppError;
use crate::repository::users;
use crate::validators::{validate_email, validate_password, validate_username};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

pub struct AuthService {
    pool: PgPool,
    jwt: JwtSettings,
}

impl AuthService {
    pub fn new(pool: PgPool, jwt: JwtSettings) -> Self {
        Self { pool, jwt }
    }

    /// Creates an active user and opens their first session.
    pub async fn register(&self, request: &RegisterRequest) -> Result<TokenPair, AppError> {
        let username = validate_username(&request.username)?;
        let email = validate_email(&request.email)?;
        validate_password(&request.password, &request.confirm_password)?;

        let password_hash = hash_password(&request.password)?;

        let mut tx = self.pool.begin().await?;
        let user = users::insert(&mut tx, &username, &email, &password_hash).await?;

        let pair = issue_token_pair(user.id, &user.username, &self.jwt)?;
        token_store::replace(&mut tx, user.id, &pair.refresh_token).await?;
        tx.commit().await?;

        tracing::info!(user_id = user.id, "User registered");
        Ok(pair)
    }

    /// Opens a new session, superseding any prior one for the same user.
    ///
    /// Unknown email, inactive account and wrong password all produce the
    /// same `InvalidCredentials` so the response does not reveal which
    /// check failed.
    pub async fn login(&self, email: &str, password: &str) -> Result<TokenPair, AppError> {
        let mut tx = self.pool.begin().await?;

        let user = match users::find_by_email(&mut *tx, email).await? {
            Some(user) if user.is_active => user,
            _ => return Err(AppError::InvalidCredentials),
        };
        if !verify_password(password, &user.password_hash) {
            return Err(AppError::InvalidCredentials);
        }

        let pair = issue_token_pair(user.id, &user.username, &self.jwt)?;
        token_store::replace(&mut tx, user.id, &pair.refresh_token).await?;
        tx.commit().await?;

        tracing::info!(user_id = user.id, "User logged in");
        Ok(pair)
    }

    /// Exchanges a live refresh token for a new pair. Single-use: the
    /// rotation UPDATE is filtered by the presented token, so replaying a
    /// rotated token matches zero rows and fails.
    pub async fn refresh(&self, presented_token: &str) -> Result<TokenPair, AppError> {
        let claims = verify_token(presented_token, &self.jwt)?;
        if claims.token_type != TokenKind::Refresh {
            return Err(AppError::WrongTokenKind);
        }
        let user_id = claims.user_id()?;

        let mut tx = self.pool.begin().await?;
        let user = users::find_by_id(&mut *tx, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User".to_string()))?;
        if !user.is_active {
            return Err(AppError::UserInactive);
        }

        let pair = issue_token_pair(user.id, &user.username, &self.jwt)?;
        let rotated = token_store::rotate(&mut tx, user.id, presented_token, &pair.refresh_token)
            .await?;
        if rotated == 0 {
            return Err(AppError::TokenRefresh);
        }
        tx.commit().await?;

        tracing::info!(user_id = user.id, "Tokens rotated");
        Ok(pair)
    }

    /// Ends the user's session on this device. Idempotent.
    pub async fn logout(&self, user_id: i64) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;
        let revoked = token_store::revoke_all(&mut tx, user_id).await?;
        tx.commit().await?;

        tracing::info!(user_id = user_id, revoked = revoked, "User logged out");
        Ok(())
    }

    /// Pure verification used by the middleware: signature/expiry first,
    /// then the kind. A well-signed refresh token is rejected here with
    /// `WrongTokenKind`, never accepted as an access token.
    pub fn verify_access_token(token: &str, jwt: &JwtSettings) -> Result<Claims, AppError> {
        let claims = verify_token(token, jwt)?;
        if claims.token_type != TokenKind::Access {
            return Err(AppError::WrongTokenKind);
        }
        Ok(claims)
    }
}
