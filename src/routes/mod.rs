mod auth;
mod health_check;
mod posts;
mod users;

pub use auth::{login, logout, refresh, register, LoginForm, TokenResponse, REFRESH_COOKIE};
pub use health_check::health_check;
pub use posts::{create_post, delete_post, get_post, list_posts, update_post, PostResponse};
pub use users::{
    change_password, deactivate_user, get_user, get_user_with_posts, list_users, update_username,
    UserResponse,
};
