/// Authentication routes.
///
/// The access token travels in the response body; the refresh token only
/// ever travels in an httponly cookie. Login is form-encoded with the
/// email in the `username` field (OAuth2 password-flow shape).

use actix_web::cookie::{Cookie, SameSite};
use actix_web::{web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::auth::{AuthService, Claims, RegisterRequest, TokenPair};
use crate::error::AppError;

pub const REFRESH_COOKIE: &str = "user_refresh_token";

#[derive(Deserialize)]
pub struct LoginForm {
    /// The user's email (field named per the OAuth2 password flow).
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

impl From<&TokenPair> for TokenResponse {
    fn from(pair: &TokenPair) -> Self {
        Self {
            access_token: pair.access_token.clone(),
            token_type: "bearer".to_string(),
        }
    }
}

fn refresh_cookie(token: &str) -> Cookie<'static> {
    Cookie::build(REFRESH_COOKIE, token.to_string())
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Lax)
        .finish()
}

fn removal_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::new(REFRESH_COOKIE, "");
    cookie.set_path("/");
    cookie.make_removal();
    cookie
}

/// POST /auth/register
pub async fn register(
    form: web::Json<RegisterRequest>,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let pair = auth.register(&form).await?;

    Ok(HttpResponse::Created()
        .cookie(refresh_cookie(&pair.refresh_token))
        .json(TokenResponse::from(&pair)))
}

/// POST /auth/login
pub async fn login(
    form: web::Form<LoginForm>,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let pair = auth.login(&form.username, &form.password).await?;

    Ok(HttpResponse::Ok()
        .cookie(refresh_cookie(&pair.refresh_token))
        .json(TokenResponse::from(&pair)))
}

/// POST /auth/refresh — reads the refresh cookie, rotates it.
pub async fn refresh(
    request: HttpRequest,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let presented = request
        .cookie(REFRESH_COOKIE)
        .map(|c| c.value().to_string())
        .ok_or(AppError::InvalidToken)?;

    let pair = auth.refresh(&presented).await?;

    Ok(HttpResponse::Ok()
        .cookie(refresh_cookie(&pair.refresh_token))
        .json(TokenResponse::from(&pair)))
}

/// POST /auth/logout — bearer-protected; clears the cookie and the store.
pub async fn logout(
    claims: web::ReqData<Claims>,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let user_id = claims.user_id()?;
    auth.logout(user_id).await?;

    Ok(HttpResponse::Ok()
        .cookie(removal_cookie())
        .json(serde_json::json!({ "message": "Logged out" })))
}
