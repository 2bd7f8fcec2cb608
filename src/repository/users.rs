/// User persistence. Explicit SQL per operation; sqlx faults are converted
/// to the application taxonomy at this boundary via `From<sqlx::Error>`.

use chrono::{DateTime, Utc};
use sqlx::{PgExecutor, PgPool, Postgres, Transaction};

use crate::error::AppError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub async fn insert(
    tx: &mut Transaction<'_, Postgres>,
    username: &str,
    email: &str,
    password_hash: &str,
) -> Result<User, AppError> {
    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (username, email, password_hash, is_active, created_at, updated_at)
        VALUES ($1, $2, $3, TRUE, now(), now())
        RETURNING id, username, email, password_hash, is_active, created_at, updated_at
        "#,
    )
    .bind(username)
    .bind(email)
    .bind(password_hash)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| match AppError::from(e) {
        AppError::Duplicate(_) => AppError::Duplicate("User".to_string()),
        other => other,
    })?;

    Ok(user)
}

pub async fn find_by_id(
    executor: impl PgExecutor<'_>,
    user_id: i64,
) -> Result<Option<User>, AppError> {
    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT id, username, email, password_hash, is_active, created_at, updated_at
        FROM users WHERE id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(executor)
    .await?;

    Ok(user)
}

pub async fn find_by_email(
    executor: impl PgExecutor<'_>,
    email: &str,
) -> Result<Option<User>, AppError> {
    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT id, username, email, password_hash, is_active, created_at, updated_at
        FROM users WHERE email = $1
        "#,
    )
    .bind(email)
    .fetch_optional(executor)
    .await?;

    Ok(user)
}

pub async fn list_active(pool: &PgPool) -> Result<Vec<User>, AppError> {
    let users = sqlx::query_as::<_, User>(
        r#"
        SELECT id, username, email, password_hash, is_active, created_at, updated_at
        FROM users WHERE is_active = TRUE ORDER BY id
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(users)
}

/// Self-service mutations only apply to active accounts, so both updates
/// filter on `is_active = TRUE`. Zero rows therefore means "missing or
/// inactive" and the caller disambiguates with a prior lookup.
pub async fn update_username(
    tx: &mut Transaction<'_, Postgres>,
    user_id: i64,
    username: &str,
) -> Result<Option<User>, AppError> {
    let user = sqlx::query_as::<_, User>(
        r#"
        UPDATE users SET username = $1, updated_at = now()
        WHERE id = $2 AND is_active = TRUE
        RETURNING id, username, email, password_hash, is_active, created_at, updated_at
        "#,
    )
    .bind(username)
    .bind(user_id)
    .fetch_optional(&mut *tx)
    .await
    .map_err(|e| match AppError::from(e) {
        AppError::Duplicate(_) => AppError::Duplicate("User".to_string()),
        other => other,
    })?;

    Ok(user)
}

pub async fn update_password(
    tx: &mut Transaction<'_, Postgres>,
    user_id: i64,
    password_hash: &str,
) -> Result<Option<User>, AppError> {
    let user = sqlx::query_as::<_, User>(
        r#"
        UPDATE users SET password_hash = $1, updated_at = now()
        WHERE id = $2 AND is_active = TRUE
        RETURNING id, username, email, password_hash, is_active, created_at, updated_at
        "#,
    )
    .bind(password_hash)
    .bind(user_id)
    .fetch_optional(&mut *tx)
    .await?;

    Ok(user)
}

/// Flips `is_active` to false and hard-deletes the user's posts in one
/// unit. Returns (users updated, posts deleted); the caller treats more
/// than one updated user as an integrity violation.
pub async fn deactivate(
    tx: &mut Transaction<'_, Postgres>,
    user_id: i64,
) -> Result<(u64, u64), AppError> {
    let users_updated = sqlx::query(
        "UPDATE users SET is_active = FALSE, updated_at = now() WHERE id = $1",
    )
    .bind(user_id)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    let posts_deleted = sqlx::query("DELETE FROM posts WHERE user_id = $1")
        .bind(user_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    Ok((users_updated, posts_deleted))
}
