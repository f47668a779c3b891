//! Security-specific error types.

use thiserror::Error;

use crate::access_mode::{AuthorizationViolation, ViolationKind};

/// Errors surfaced by subjects and the auth manager.
#[derive(Debug, Error)]
pub enum SecurityError {
    /// Operation attempted under insufficient capability.
    #[error("authorization denied: {0}")]
    AuthorizationDenied(String),

    /// Credentials were valid but must be rotated before use.
    #[error("credentials expired: {0}")]
    CredentialsExpired(String),

    /// New password rejected by the password manager.
    #[error("invalid credential: {0}")]
    InvalidCredential(String),

    /// Credential store could not durably record a change.
    #[error("persistence failure: {0}")]
    PersistenceFailure(String),

    /// Malformed request, such as an empty username or a duplicate user.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Identity not recognized.
    #[error("unknown user: {0}")]
    UnknownUser(String),

    /// A subject of the wrong kind was passed to a kind-specific operation.
    #[error("illegal subject type: expected {expected}, got {actual}")]
    IllegalSubjectType {
        /// Kind the operation requires.
        expected: &'static str,
        /// Kind that was supplied.
        actual: &'static str,
    },
}

/// Result type for security operations.
pub type SecurityResult<T> = Result<T, SecurityError>;

impl SecurityError {
    /// Wrap a storage-layer error as a persistence failure.
    pub(crate) fn persistence(err: impl std::fmt::Display) -> Self {
        SecurityError::PersistenceFailure(err.to_string())
    }
}

impl From<AuthorizationViolation> for SecurityError {
    fn from(violation: AuthorizationViolation) -> Self {
        match violation.kind() {
            ViolationKind::Unauthorized => {
                SecurityError::AuthorizationDenied(violation.message().to_string())
            }
            ViolationKind::CredentialsExpired => {
                SecurityError::CredentialsExpired(violation.message().to_string())
            }
        }
    }
}
