/// Password hashing with bcrypt.
///
/// Strength policy lives in `validators`; this module only hashes and
/// verifies. Plaintext never reaches a log statement.

use bcrypt::{hash, verify, DEFAULT_COST};

use crate::error::AppError;

pub fn hash_password(password: &str) -> Result<String, AppError> {
    hash(password, DEFAULT_COST)
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
}

/// Returns false for a wrong password and for a malformed digest. A digest
/// that bcrypt cannot parse is treated as a failed match, not an error.
pub fn verify_password(password: &str, digest: &str) -> bool {
    verify(password, digest).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify() {
        let digest = hash_password("Aa1$aaaa").unwrap();
        assert_ne!(digest, "Aa1$aaaa");
        assert!(digest.starts_with("$2"));
        assert!(verify_password("Aa1$aaaa", &digest));
    }

    #[test]
    fn wrong_password_fails() {
        let digest = hash_password("Aa1$aaaa").unwrap();
        assert!(!verify_password("Bb2$bbbb", &digest));
    }

    #[test]
    fn malformed_digest_returns_false() {
        assert!(!verify_password("Aa1$aaaa", "not-a-bcrypt-digest"));
        assert!(!verify_password("Aa1$aaaa", ""));
    }

    #[test]
    fn same_password_hashes_differently() {
        // salted
        let a = hash_password("Aa1$aaaa").unwrap();
        let b = hash_password("Aa1$aaaa").unwrap();
        assert_ne!(a, b);
    }
}
