/// Post routes. Reads are public; mutations require a bearer token, and
/// ownership of existing posts is enforced by the (id, user_id) filter in
/// the repository. The existence check beforehand is what turns "zero rows
/// touched" into either 404 or 403.

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::auth::Claims;
use crate::error::AppError;
use crate::repository::posts;
use crate::validators::validate_post;

#[derive(Deserialize)]
pub struct PostInput {
    pub title: String,
    pub text: String,
}

#[derive(Serialize)]
pub struct PostResponse {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub text: String,
    pub author: String,
}

impl From<posts::Post> for PostResponse {
    fn from(post: posts::Post) -> Self {
        Self {
            id: post.id,
            user_id: post.user_id,
            title: post.title,
            text: post.text,
            author: post.author,
        }
    }
}

/// GET /posts
pub async fn list_posts(pool: web::Data<PgPool>) -> Result<HttpResponse, AppError> {
    let posts = posts::list_all(pool.get_ref()).await?;
    let body: Vec<PostResponse> = posts.into_iter().map(PostResponse::from).collect();
    Ok(HttpResponse::Ok().json(body))
}

/// GET /posts/{post_id}
pub async fn get_post(
    path: web::Path<i64>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let post_id = path.into_inner();
    let post = posts::find_by_id(pool.get_ref(), post_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Post".to_string()))?;

    Ok(HttpResponse::Ok().json(PostResponse::from(post)))
}

/// POST /posts — author is denormalized from the access token's username.
pub async fn create_post(
    form: web::Json<PostInput>,
    claims: web::ReqData<Claims>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    validate_post(&form.title, &form.text)?;

    let user_id = claims.user_id()?;
    let author = claims
        .username
        .clone()
        .ok_or(AppError::InvalidToken)?;

    let mut tx = pool.begin().await?;
    let post = posts::insert(&mut tx, user_id, &author, &form.title, &form.text).await?;
    tx.commit().await?;

    tracing::info!(user_id = user_id, post_id = post.id, "Post created");
    Ok(HttpResponse::Created().json(PostResponse::from(post)))
}

/// PATCH /posts/{post_id}
pub async fn update_post(
    path: web::Path<i64>,
    form: web::Json<PostInput>,
    claims: web::ReqData<Claims>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    validate_post(&form.title, &form.text)?;

    let post_id = path.into_inner();
    let user_id = claims.user_id()?;

    let mut tx = pool.begin().await?;
    if !posts::exists(&mut *tx, post_id).await? {
        return Err(AppError::NotFound("Post".to_string()));
    }
    let post = posts::update_owned(&mut tx, post_id, user_id, &form.title, &form.text)
        .await?
        .ok_or(AppError::PermissionDenied)?;
    tx.commit().await?;

    Ok(HttpResponse::Ok().json(PostResponse::from(post)))
}

/// DELETE /posts/{post_id}
pub async fn delete_post(
    path: web::Path<i64>,
    claims: web::ReqData<Claims>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let post_id = path.into_inner();
    let user_id = claims.user_id()?;

    let mut tx = pool.begin().await?;
    if !posts::exists(&mut *tx, post_id).await? {
        return Err(AppError::NotFound("Post".to_string()));
    }
    let deleted = posts::delete_owned(&mut tx, post_id, user_id).await?;
    if deleted < 1 {
        return Err(AppError::PermissionDenied);
    }
    tx.commit().await?;

    tracing::info!(user_id = user_id, post_id = post_id, "Post deleted");
    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": "Post was deleted" })))
}
