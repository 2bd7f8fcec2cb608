/// Input validation for registration and self-service mutations.
///
/// Policy:
/// - usernames are word characters only, no embedded whitespace, max 50
/// - emails follow a simplified RFC 5322 shape, max 70 (column width)
/// - passwords are 8..=50 chars and carry at least one letter, one digit
///   and one non-alphanumeric symbol

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::AppError;

const MAX_USERNAME_LENGTH: usize = 50;
const MAX_EMAIL_LENGTH: usize = 70;
const MIN_EMAIL_LENGTH: usize = 5;
const MIN_PASSWORD_LENGTH: usize = 8;
const MAX_PASSWORD_LENGTH: usize = 50;
const MAX_TITLE_LENGTH: usize = 40;

lazy_static! {
    static ref USERNAME_REGEX: Regex = Regex::new(r"^\w+$").unwrap();
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$"
    ).unwrap();
}

/// Returns the trimmed username or a `ValidationError`.
pub fn validate_username(username: &str) -> Result<String, AppError> {
    let trimmed = username.trim();

    if trimmed.is_empty() {
        return Err(AppError::Validation("username is empty".to_string()));
    }
    if trimmed.len() > MAX_USERNAME_LENGTH {
        return Err(AppError::Validation(format!(
            "username is too long (maximum {} characters)",
            MAX_USERNAME_LENGTH
        )));
    }
    if !USERNAME_REGEX.is_match(trimmed) {
        return Err(AppError::Validation(
            "username must not contain whitespace or special characters".to_string(),
        ));
    }

    Ok(trimmed.to_string())
}

/// Returns the trimmed email or a `ValidationError`.
pub fn validate_email(email: &str) -> Result<String, AppError> {
    let trimmed = email.trim();

    if trimmed.len() < MIN_EMAIL_LENGTH {
        return Err(AppError::Validation(format!(
            "email is too short (minimum {} characters)",
            MIN_EMAIL_LENGTH
        )));
    }
    if trimmed.len() > MAX_EMAIL_LENGTH {
        return Err(AppError::Validation(format!(
            "email is too long (maximum {} characters)",
            MAX_EMAIL_LENGTH
        )));
    }
    if !EMAIL_REGEX.is_match(trimmed) {
        return Err(AppError::Validation("email has invalid format".to_string()));
    }

    Ok(trimmed.to_string())
}

/// Checks password strength and that both entries match.
pub fn validate_password(password: &str, confirm_password: &str) -> Result<(), AppError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AppError::Validation(format!(
            "password is too short (minimum {} characters)",
            MIN_PASSWORD_LENGTH
        )));
    }
    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(AppError::Validation(format!(
            "password is too long (maximum {} characters)",
            MAX_PASSWORD_LENGTH
        )));
    }

    let has_letter = password.chars().any(|c| c.is_alphabetic());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_symbol = password.chars().any(|c| !c.is_alphanumeric());

    if !has_letter || !has_digit || !has_symbol {
        return Err(AppError::Validation(
            "password must contain at least one letter, one digit and one special character"
                .to_string(),
        ));
    }

    if password != confirm_password {
        return Err(AppError::Validation("passwords do not match".to_string()));
    }

    Ok(())
}

/// Title is 1..=40 characters, text is non-empty.
pub fn validate_post(title: &str, text: &str) -> Result<(), AppError> {
    if title.trim().is_empty() {
        return Err(AppError::Validation("title is empty".to_string()));
    }
    if title.len() > MAX_TITLE_LENGTH {
        return Err(AppError::Validation(format!(
            "title is too long (maximum {} characters)",
            MAX_TITLE_LENGTH
        )));
    }
    if text.trim().is_empty() {
        return Err(AppError::Validation("text is empty".to_string()));
    }
    Ok(())
}
