/// Application Error Taxonomy
///
/// Every fallible path in the application funnels into `AppError`. Each
/// variant maps to exactly one HTTP status and a stable machine-readable
/// code, so handlers never hand-craft error responses. Raw sqlx faults are
/// converted once, at the repository boundary, and never leak further up.

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use std::error::Error as StdError;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    /// Bad input shape or policy violation (password rules, field limits).
    Validation(String),
    /// Unique constraint violation (username or email already taken).
    Duplicate(String),
    /// Login failed. Deliberately identical for unknown email, inactive
    /// account, and wrong password.
    InvalidCredentials,
    /// Signature invalid, payload unparsable, missing sub/exp, or expired.
    InvalidToken,
    /// Cryptographically valid token presented with the wrong kind.
    WrongTokenKind,
    /// Refresh rotation matched zero rows (stale or already rotated token).
    TokenRefresh,
    /// Missing or malformed Authorization header.
    Unauthenticated,
    /// Authenticated subject does not own the resource.
    PermissionDenied,
    /// Target account has been deactivated.
    UserInactive,
    NotFound(String),
    /// Deactivation touched more than one user row.
    UserDeletionIntegrity,
    /// Any persistence fault not otherwise classified.
    Transaction(String),
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation(msg) => write!(f, "{}", msg),
            AppError::Duplicate(what) => write!(f, "{} already exists", what),
            AppError::InvalidCredentials => write!(f, "Invalid email or password"),
            AppError::InvalidToken => write!(f, "Invalid or expired token"),
            AppError::WrongTokenKind => write!(f, "Wrong token kind"),
            AppError::TokenRefresh => write!(f, "Token refresh is not possible"),
            AppError::Unauthenticated => write!(f, "Missing authentication token"),
            AppError::PermissionDenied => write!(f, "Forbidden action"),
            AppError::UserInactive => write!(f, "Account is inactive"),
            AppError::NotFound(what) => write!(f, "{} not found", what),
            AppError::UserDeletionIntegrity => {
                write!(f, "Deactivation affected more than one user")
            }
            AppError::Transaction(msg) => write!(f, "Transaction failed: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl StdError for AppError {}

impl AppError {
    /// Stable machine-readable code included in every error response.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Duplicate(_) => "DUPLICATE_ENTRY",
            AppError::InvalidCredentials => "INVALID_CREDENTIALS",
            AppError::InvalidToken => "TOKEN_INVALID",
            AppError::WrongTokenKind => "WRONG_TOKEN_KIND",
            AppError::TokenRefresh => "TOKEN_REFRESH_FAILED",
            AppError::Unauthenticated => "UNAUTHENTICATED",
            AppError::PermissionDenied => "PERMISSION_DENIED",
            AppError::UserInactive => "ACCOUNT_INACTIVE",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::UserDeletionIntegrity => "DELETION_INTEGRITY",
            AppError::Transaction(_) => "TRANSACTION_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    fn log(&self, error_id: &str) {
        match self {
            AppError::Transaction(_)
            | AppError::Internal(_)
            | AppError::UserDeletionIntegrity => {
                tracing::error!(error_id = error_id, error = %self, code = self.code(), "Request failed");
            }
            _ => {
                tracing::warn!(error_id = error_id, error = %self, code = self.code(), "Request rejected");
            }
        }
    }

    /// Message exposed to the client. 5xx variants never reveal internal
    /// detail beyond the error kind.
    fn public_message(&self) -> String {
        match self {
            AppError::Transaction(_) => "Transaction failed".to_string(),
            AppError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => AppError::NotFound("Record".to_string()),
            sqlx::Error::Database(db_err) => {
                // 23505 = Postgres unique_violation
                if db_err.code().as_deref() == Some("23505") {
                    AppError::Duplicate("Record".to_string())
                } else {
                    AppError::Transaction(err.to_string())
                }
            }
            _ => AppError::Transaction(err.to_string()),
        }
    }
}

/// Error payload returned by every failing endpoint.
#[derive(Debug, serde::Serialize)]
pub struct ErrorResponse {
    pub error_id: String,
    pub message: String,
    pub code: String,
    pub status: u16,
    pub timestamp: String,
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Duplicate(_) => StatusCode::CONFLICT,
            AppError::InvalidCredentials
            | AppError::InvalidToken
            | AppError::WrongTokenKind
            | AppError::TokenRefresh
            | AppError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AppError::PermissionDenied | AppError::UserInactive => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::UserDeletionIntegrity
            | AppError::Transaction(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let error_id = uuid::Uuid::new_v4().to_string();
        self.log(&error_id);

        let status = self.status_code();
        HttpResponse::build(status).json(ErrorResponse {
            error_id,
            message: self.public_message(),
            code: self.code().to_string(),
            status: status.as_u16(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        })
    }
}
