/// Access control and request logging middleware.

mod jwt_middleware;
mod request_logging;

pub use jwt_middleware::JwtMiddleware;
pub use request_logging::RequestLogging;

use crate::auth::Claims;
use crate::error::AppError;

/// Ownership rule applied before every mutating self-service or resource
/// endpoint: the authenticated subject must equal the owning user id.
pub fn check_owner(resource_owner_id: i64, claims: &Claims) -> Result<(), AppError> {
    if claims.user_id()? != resource_owner_id {
        return Err(AppError::PermissionDenied);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owner_passes() {
        let claims = Claims::access(5, "grisha", 900);
        assert!(check_owner(5, &claims).is_ok());
    }

    #[test]
    fn non_owner_is_denied() {
        let claims = Claims::access(6, "intruder", 900);
        assert!(matches!(
            check_owner(5, &claims),
            Err(AppError::PermissionDenied)
        ));
    }
}
