//! Fixed subjects for the unauthenticated and auth-disabled cases.
//!
//! Both are zero-sized and hold no state, so the statics can be read from any
//! number of sessions at once.

use tracing::debug;

use crate::access_mode::{AccessMode, AuthorizationViolation, StaticAccessMode};
use crate::authentication::AuthenticationResult;
use crate::error::{SecurityError, SecurityResult};

use super::AuthSubject;

/// Subject used before authentication has been performed. Allows nothing.
pub static ANONYMOUS: AnonymousSubject = AnonymousSubject;

/// Subject used when authentication is disabled. Allows everything.
pub static AUTH_DISABLED: AuthDisabledSubject = AuthDisabledSubject;

/// See [`ANONYMOUS`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AnonymousSubject;

impl AnonymousSubject {
    const MODE: StaticAccessMode = StaticAccessMode::NONE;
}

impl AccessMode for AnonymousSubject {
    fn allows_reads(&self) -> bool {
        Self::MODE.allows_reads()
    }

    fn allows_writes(&self) -> bool {
        Self::MODE.allows_writes()
    }

    fn allows_schema_writes(&self) -> bool {
        Self::MODE.allows_schema_writes()
    }

    fn is_overridden(&self) -> bool {
        Self::MODE.is_overridden()
    }

    fn allows_procedure_with(&self, _role_names: &[&str]) -> bool {
        false
    }

    fn on_violation(&self, message: &str) -> AuthorizationViolation {
        Self::MODE.on_violation(message)
    }

    fn name(&self) -> &str {
        "<anonymous>"
    }
}

impl AuthSubject for AnonymousSubject {
    fn logout(&mut self) {}

    fn authentication_result(&self) -> AuthenticationResult {
        AuthenticationResult::Failure
    }

    fn set_password(
        &mut self,
        _password: &str,
        _require_password_change: bool,
    ) -> SecurityResult<()> {
        Err(SecurityError::AuthorizationDenied(
            "Anonymous cannot change password".to_string(),
        ))
    }

    fn set_password_change_no_longer_required(&mut self) {}

    fn has_username(&self, _username: &str) -> bool {
        false
    }

    fn username(&self) -> Option<&str> {
        None
    }
}

/// See [`AUTH_DISABLED`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AuthDisabledSubject;

impl AuthDisabledSubject {
    const MODE: StaticAccessMode = StaticAccessMode::FULL;
}

impl AccessMode for AuthDisabledSubject {
    fn allows_reads(&self) -> bool {
        Self::MODE.allows_reads()
    }

    fn allows_writes(&self) -> bool {
        Self::MODE.allows_writes()
    }

    fn allows_schema_writes(&self) -> bool {
        Self::MODE.allows_schema_writes()
    }

    fn is_overridden(&self) -> bool {
        Self::MODE.is_overridden()
    }

    fn allows_procedure_with(&self, _role_names: &[&str]) -> bool {
        true
    }

    fn on_violation(&self, message: &str) -> AuthorizationViolation {
        Self::MODE.on_violation(message)
    }

    fn name(&self) -> &str {
        "<auth disabled>"
    }
}

impl AuthSubject for AuthDisabledSubject {
    fn logout(&mut self) {}

    fn authentication_result(&self) -> AuthenticationResult {
        AuthenticationResult::Success
    }

    // Nothing to persist against while authentication is off.
    fn set_password(
        &mut self,
        _password: &str,
        _require_password_change: bool,
    ) -> SecurityResult<()> {
        debug!("ignoring password change, authentication is disabled");
        Ok(())
    }

    fn set_password_change_no_longer_required(&mut self) {}

    fn has_username(&self, _username: &str) -> bool {
        false
    }

    fn username(&self) -> Option<&str> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anonymous_allows_nothing() {
        assert!(!ANONYMOUS.allows_reads());
        assert!(!ANONYMOUS.allows_writes());
        assert!(!ANONYMOUS.allows_schema_writes());
        assert!(!ANONYMOUS.is_overridden());
        assert!(!ANONYMOUS.allows_procedure_with(&["reader"]));
        assert_eq!(ANONYMOUS.authentication_result(), AuthenticationResult::Failure);
        assert_eq!(ANONYMOUS.name(), "<anonymous>");
        assert_eq!(ANONYMOUS.username(), None);
    }

    #[test]
    fn test_anonymous_cannot_change_password() {
        let mut subject = ANONYMOUS;
        let err = subject.set_password("new", false).unwrap_err();
        assert!(
            matches!(err, SecurityError::AuthorizationDenied(ref m) if m == "Anonymous cannot change password")
        );
        assert!(subject.set_password("new", true).is_err());
    }

    #[test]
    fn test_anonymous_has_no_username() {
        assert!(!ANONYMOUS.has_username("<anonymous>"));
        assert!(!ANONYMOUS.has_username(""));
        assert!(!ANONYMOUS.has_username("admin"));
    }

    #[test]
    fn test_anonymous_lifecycle_is_inert() {
        let mut subject = ANONYMOUS;
        subject.set_password_change_no_longer_required();
        subject.logout();
        subject.logout();
        assert_eq!(subject.authentication_result(), AuthenticationResult::Failure);
        assert!(!subject.allows_reads());
    }

    #[test]
    fn test_auth_disabled_allows_everything() {
        assert!(AUTH_DISABLED.allows_reads());
        assert!(AUTH_DISABLED.allows_writes());
        assert!(AUTH_DISABLED.allows_schema_writes());
        assert!(!AUTH_DISABLED.is_overridden());
        assert!(AUTH_DISABLED.allows_procedure_with(&[]));
        assert!(AUTH_DISABLED.allows_procedure_with(&["admin", "publisher"]));
        assert_eq!(AUTH_DISABLED.authentication_result(), AuthenticationResult::Success);
        assert_eq!(AUTH_DISABLED.name(), "<auth disabled>");
    }

    #[test]
    fn test_auth_disabled_accepts_password_change() {
        let mut subject = AUTH_DISABLED;
        assert!(subject.set_password("anything", true).is_ok());
        assert_eq!(subject.authentication_result(), AuthenticationResult::Success);
        assert!(!subject.has_username("<auth disabled>"));
    }

    #[test]
    fn test_sentinel_snapshots() {
        let snapshot = AUTH_DISABLED.snapshot();
        assert!(snapshot.allows_schema_writes());
        assert!(snapshot.allows_procedure_with(&["x"]));
        assert_eq!(snapshot.name(), "<auth disabled>");

        let snapshot = ANONYMOUS.snapshot();
        assert!(!snapshot.allows_reads());
        assert!(!snapshot.allows_procedure_with(&[]));
    }

    #[test]
    fn test_sentinels_shared_across_threads() {
        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    assert!(!ANONYMOUS.allows_reads());
                    assert!(AUTH_DISABLED.allows_writes());
                    assert_eq!(ANONYMOUS.name(), "<anonymous>");
                });
            }
        });
    }
}
