/// Signed token payload.
///
/// Access and refresh tokens share one signing secret and one claims
/// layout; the `token_type` discriminator is what keeps a leaked refresh
/// token from standing in for an access token.

use serde::{Deserialize, Serialize};

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenKind::Access => write!(f, "access"),
            TokenKind::Refresh => write!(f, "refresh"),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject: user id as a decimal string.
    pub sub: String,
    /// Display name. Present on access tokens only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Expiration (Unix timestamp).
    pub exp: i64,
    /// Issued at (Unix timestamp).
    pub iat: i64,
    pub token_type: TokenKind,
}

impl Claims {
    pub fn access(user_id: i64, username: &str, expiry_seconds: i64) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            sub: user_id.to_string(),
            username: Some(username.to_string()),
            exp: now + expiry_seconds,
            iat: now,
            token_type: TokenKind::Access,
        }
    }

    pub fn refresh(user_id: i64, expiry_seconds: i64) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            sub: user_id.to_string(),
            username: None,
            exp: now + expiry_seconds,
            iat: now,
            token_type: TokenKind::Refresh,
        }
    }

    /// Parses the subject back into a user id.
    pub fn user_id(&self) -> Result<i64, AppError> {
        self.sub.parse::<i64>().map_err(|_| AppError::InvalidToken)
    }

    pub fn is_expired(&self) -> bool {
        self.exp < chrono::Utc::now().timestamp()
    }
}
