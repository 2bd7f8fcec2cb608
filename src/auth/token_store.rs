/// Refresh token store: at most one live row per user.
///
/// The `refresh_tokens` table carries a UNIQUE(user_id) constraint, so the
/// single-active-session policy is enforced by the schema, not by
/// convention. All mutations run inside the caller's transaction.

use sqlx::{PgPool, Postgres, Transaction};

use crate::error::AppError;

/// Removes any prior row for the user and inserts the new token.
///
/// Used on register and login: a fresh login supersedes whatever session
/// existed before.
pub async fn replace(
    tx: &mut Transaction<'_, Postgres>,
    user_id: i64,
    refresh_token: &str,
) -> Result<(), AppError> {
    sqlx::query("DELETE FROM refresh_tokens WHERE user_id = $1")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query(
        r#"
        INSERT INTO refresh_tokens (user_id, refresh_token, created_at)
        VALUES ($1, $2, now())
        "#,
    )
    .bind(user_id)
    .bind(refresh_token)
    .execute(&mut *tx)
    .await?;

    Ok(())
}

/// Swaps the stored token for a new one, but only if the presented token is
/// still the current one. Returns the number of rows updated.
///
/// Zero rows means the presented token was already rotated away (or never
/// stored); the row lock taken by the UPDATE guarantees that two racing
/// rotations of the same token produce at most one winner.
pub async fn rotate(
    tx: &mut Transaction<'_, Postgres>,
    user_id: i64,
    presented_token: &str,
    new_token: &str,
) -> Result<u64, AppError> {
    let result = sqlx::query(
        r#"
        UPDATE refresh_tokens
        SET refresh_token = $1, created_at = now()
        WHERE user_id = $2 AND refresh_token = $3
        "#,
    )
    .bind(new_token)
    .bind(user_id)
    .bind(presented_token)
    .execute(&mut *tx)
    .await?;

    Ok(result.rows_affected())
}

/// Deletes every stored row for the user. Idempotent; logging out twice is
/// not an error.
pub async fn revoke_all(
    tx: &mut Transaction<'_, Postgres>,
    user_id: i64,
) -> Result<u64, AppError> {
    let result = sqlx::query("DELETE FROM refresh_tokens WHERE user_id = $1")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    Ok(result.rows_affected())
}

/// The currently stored token for a user, if any.
pub async fn find_current(pool: &PgPool, user_id: i64) -> Result<Option<String>, AppError> {
    let token = sqlx::query_scalar::<_, String>(
        "SELECT refresh_token FROM refresh_tokens WHERE user_id = $1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(token)
}
