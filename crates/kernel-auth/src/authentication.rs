//! Outcome of a credential check.

use serde::{Deserialize, Serialize};

use crate::access_mode::StaticAccessMode;

/// Result of checking a user's credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuthenticationResult {
    /// Credentials accepted, full access granted.
    Success,
    /// Credentials rejected, or the session has logged out.
    Failure,
    /// Credentials accepted, but the password must be changed before any
    /// operation is allowed.
    PasswordChangeRequired,
}

impl AuthenticationResult {
    /// The capability bundle a subject holds in this state.
    pub fn access_mode(self) -> StaticAccessMode {
        match self {
            AuthenticationResult::Success => StaticAccessMode::FULL,
            AuthenticationResult::PasswordChangeRequired => StaticAccessMode::CREDENTIALS_EXPIRED,
            AuthenticationResult::Failure => StaticAccessMode::NONE,
        }
    }

    /// Whether the credentials were accepted, even if a change is pending.
    pub fn is_authenticated(self) -> bool {
        !matches!(self, AuthenticationResult::Failure)
    }
}

impl std::fmt::Display for AuthenticationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthenticationResult::Success => write!(f, "SUCCESS"),
            AuthenticationResult::Failure => write!(f, "FAILURE"),
            AuthenticationResult::PasswordChangeRequired => write!(f, "PASSWORD_CHANGE_REQUIRED"),
        }
    }
}
