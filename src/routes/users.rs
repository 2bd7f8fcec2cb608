/// User routes. Reads are public (active accounts only); username change,
/// password change and deactivation are bearer-protected and gated by
/// `check_owner`, so a user can only mutate their own account.

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::auth::{hash_password, verify_password, Claims};
use crate::error::AppError;
use crate::middleware::check_owner;
use crate::repository::{posts, users};
use crate::routes::posts::PostResponse;
use crate::validators::{validate_password, validate_username};

#[derive(Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub is_active: bool,
}

impl From<users::User> for UserResponse {
    fn from(user: users::User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            is_active: user.is_active,
        }
    }
}

#[derive(Serialize)]
pub struct UserWithPosts {
    #[serde(flatten)]
    pub user: UserResponse,
    pub posts: Vec<PostResponse>,
}

#[derive(Deserialize)]
pub struct ChangeUsername {
    pub username: String,
}

#[derive(Deserialize)]
pub struct ChangePassword {
    pub password: String,
    pub new_password: String,
    pub confirm_password: String,
}

async fn active_user_by_id(pool: &PgPool, user_id: i64) -> Result<users::User, AppError> {
    let user = users::find_by_id(pool, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User".to_string()))?;
    if !user.is_active {
        return Err(AppError::UserInactive);
    }
    Ok(user)
}

/// GET /users
pub async fn list_users(pool: web::Data<PgPool>) -> Result<HttpResponse, AppError> {
    let users = users::list_active(pool.get_ref()).await?;
    let body: Vec<UserResponse> = users.into_iter().map(UserResponse::from).collect();
    Ok(HttpResponse::Ok().json(body))
}

/// GET /users/{user_id}
pub async fn get_user(
    path: web::Path<i64>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let user = active_user_by_id(pool.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(UserResponse::from(user)))
}

/// GET /users/{user_id}/posts
pub async fn get_user_with_posts(
    path: web::Path<i64>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let user = active_user_by_id(pool.get_ref(), path.into_inner()).await?;
    let posts = posts::list_by_user(pool.get_ref(), user.id).await?;

    Ok(HttpResponse::Ok().json(UserWithPosts {
        user: UserResponse::from(user),
        posts: posts.into_iter().map(PostResponse::from).collect(),
    }))
}

/// PATCH /users/{user_id}/username — owner only, active accounts only.
pub async fn update_username(
    path: web::Path<i64>,
    form: web::Json<ChangeUsername>,
    claims: web::ReqData<Claims>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let user_id = path.into_inner();
    check_owner(user_id, &claims)?;
    let username = validate_username(&form.username)?;

    let mut tx = pool.begin().await?;
    let user = users::update_username(&mut tx, user_id, &username)
        .await?
        .ok_or(AppError::UserInactive)?;
    tx.commit().await?;

    tracing::info!(user_id = user_id, "Username changed");
    Ok(HttpResponse::Ok().json(UserResponse::from(user)))
}

/// PATCH /users/{user_id}/password — owner only; the old password is
/// verified before the new one is accepted.
pub async fn change_password(
    path: web::Path<i64>,
    form: web::Json<ChangePassword>,
    claims: web::ReqData<Claims>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let user_id = path.into_inner();
    check_owner(user_id, &claims)?;

    let mut tx = pool.begin().await?;
    let user = users::find_by_id(&mut *tx, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User".to_string()))?;
    if !user.is_active {
        return Err(AppError::UserInactive);
    }
    if !verify_password(&form.password, &user.password_hash) {
        return Err(AppError::InvalidCredentials);
    }
    validate_password(&form.new_password, &form.confirm_password)?;

    let password_hash = hash_password(&form.new_password)?;
    let user = users::update_password(&mut tx, user_id, &password_hash)
        .await?
        .ok_or(AppError::UserInactive)?;
    tx.commit().await?;

    tracing::info!(user_id = user_id, "Password changed");
    Ok(HttpResponse::Ok().json(UserResponse::from(user)))
}

/// PATCH /users/{user_id}/deactivate — owner only. Posts are hard-deleted,
/// the account is flagged inactive, stored sessions are revoked; the user
/// row itself is never removed.
pub async fn deactivate_user(
    path: web::Path<i64>,
    claims: web::ReqData<Claims>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let user_id = path.into_inner();
    check_owner(user_id, &claims)?;

    let mut tx = pool.begin().await?;
    let (users_updated, posts_deleted) = users::deactivate(&mut tx, user_id).await?;
    if users_updated > 1 {
        // rollback via drop; the id is the primary key so this should be
        // unreachable
        return Err(AppError::UserDeletionIntegrity);
    }
    if users_updated == 0 {
        return Err(AppError::NotFound("User".to_string()));
    }
    crate::auth::token_store::revoke_all(&mut tx, user_id).await?;
    tx.commit().await?;

    tracing::info!(
        user_id = user_id,
        posts_deleted = posts_deleted,
        "User deactivated"
    );
    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": "User has been deactivated" })))
}
