//! Authorization layer for org-scoped file records.
//!
//! Every file and favorite operation enters through [`AccessGuard`], which resolves the
//! caller's identity and checks their membership in the relevant organization.

mod guard;
mod identity;
mod membership;

pub use guard::AccessGuard;
pub use identity::IdentityResolver;

use thiserror::Error;

use crate::core::error::AppError;

/// Authorization failure, or a store error raised while deciding
#[derive(Debug, Error)]
pub enum AccessError {
    #[error("You have to be logged in to perform this action")]
    Unauthenticated,

    /// Also covers records that do not exist, so existence is never leaked
    #[error("You do not have access to perform this action")]
    NoAccess,

    #[error(transparent)]
    Store(#[from] AppError),
}

impl AccessError {
    /// True for authorization outcomes, false for infrastructure failures
    pub fn is_denial(&self) -> bool {
        matches!(self, AccessError::Unauthenticated | AccessError::NoAccess)
    }
}

impl From<AccessError> for AppError {
    fn from(e: AccessError) -> Self {
        match e {
            AccessError::Unauthenticated => AppError::Unauthorized(e.to_string()),
            AccessError::NoAccess => AppError::Forbidden(e.to_string()),
            AccessError::Store(inner) => inner,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_denials_map_to_auth_statuses() {
        assert!(matches!(
            AppError::from(AccessError::Unauthenticated),
            AppError::Unauthorized(_)
        ));
        assert!(matches!(
            AppError::from(AccessError::NoAccess),
            AppError::Forbidden(_)
        ));
    }

    #[test]
    fn test_store_errors_are_not_denials() {
        let error = AccessError::from(AppError::Internal("boom".to_string()));
        assert!(!error.is_denial());
        assert!(matches!(AppError::from(error), AppError::Internal(_)));
    }
}
