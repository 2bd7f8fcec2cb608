/// Post persistence.
///
/// Update and delete filter on (post id, owner id) in one statement:
/// ownership enforcement happens in the WHERE clause, and zero affected
/// rows on an existing post reads as "not yours". A prior existence check
/// disambiguates that from "no such post".

use chrono::{DateTime, Utc};
use sqlx::{PgExecutor, PgPool, Postgres, Transaction};

use crate::error::AppError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Post {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub text: String,
    pub author: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub async fn insert(
    tx: &mut Transaction<'_, Postgres>,
    user_id: i64,
    author: &str,
    title: &str,
    text: &str,
) -> Result<Post, AppError> {
    let post = sqlx::query_as::<_, Post>(
        r#"
        INSERT INTO posts (user_id, author, title, text, created_at, updated_at)
        VALUES ($1, $2, $3, $4, now(), now())
        RETURNING id, user_id, title, text, author, created_at, updated_at
        "#,
    )
    .bind(user_id)
    .bind(author)
    .bind(title)
    .bind(text)
    .fetch_one(&mut *tx)
    .await?;

    Ok(post)
}

pub async fn find_by_id(
    executor: impl PgExecutor<'_>,
    post_id: i64,
) -> Result<Option<Post>, AppError> {
    let post = sqlx::query_as::<_, Post>(
        r#"
        SELECT id, user_id, title, text, author, created_at, updated_at
        FROM posts WHERE id = $1
        "#,
    )
    .bind(post_id)
    .fetch_optional(executor)
    .await?;

    Ok(post)
}

pub async fn list_all(pool: &PgPool) -> Result<Vec<Post>, AppError> {
    let posts = sqlx::query_as::<_, Post>(
        r#"
        SELECT id, user_id, title, text, author, created_at, updated_at
        FROM posts ORDER BY id
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(posts)
}

pub async fn list_by_user(
    executor: impl PgExecutor<'_>,
    user_id: i64,
) -> Result<Vec<Post>, AppError> {
    let posts = sqlx::query_as::<_, Post>(
        r#"
        SELECT id, user_id, title, text, author, created_at, updated_at
        FROM posts WHERE user_id = $1 ORDER BY id
        "#,
    )
    .bind(user_id)
    .fetch_all(executor)
    .await?;

    Ok(posts)
}

pub async fn exists(executor: impl PgExecutor<'_>, post_id: i64) -> Result<bool, AppError> {
    let found = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM posts WHERE id = $1)")
        .bind(post_id)
        .fetch_one(executor)
        .await?;

    Ok(found)
}

/// Updates only when the post belongs to `user_id`. None = no matching
/// (id, owner) pair.
pub async fn update_owned(
    tx: &mut Transaction<'_, Postgres>,
    post_id: i64,
    user_id: i64,
    title: &str,
    text: &str,
) -> Result<Option<Post>, AppError> {
    let post = sqlx::query_as::<_, Post>(
        r#"
        UPDATE posts SET title = $1, text = $2, updated_at = now()
        WHERE id = $3 AND user_id = $4
        RETURNING id, user_id, title, text, author, created_at, updated_at
        "#,
    )
    .bind(title)
    .bind(text)
    .bind(post_id)
    .bind(user_id)
    .fetch_optional(&mut *tx)
    .await?;

    Ok(post)
}

/// Deletes only when the post belongs to `user_id`. Returns rows affected.
pub async fn delete_owned(
    tx: &mut Transaction<'_, Postgres>,
    post_id: i64,
    user_id: i64,
) -> Result<u64, AppError> {
    let result = sqlx::query("DELETE FROM posts WHERE id = $1 AND user_id = $2")
        .bind(post_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    Ok(result.rows_affected())
}
