/// Authentication core: token codec, password hashing, the refresh token
/// store and the session service orchestrating them.

mod claims;
mod jwt;
mod password;
mod service;
pub mod token_store;

pub use claims::{Claims, TokenKind};
pub use jwt::{issue_access_token, issue_refresh_token, issue_token_pair, verify_token, TokenPair};
pub use password::{hash_password, verify_password};
pub use service::{AuthService, RegisterRequest};
