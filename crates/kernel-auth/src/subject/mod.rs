//! Session subjects.
//!
//! A subject is what a session carries after its credential check: an
//! identity, the [`AuthenticationResult`] of the check, and the access mode
//! derived from it. Every subject is also an [`AccessMode`], so the kernel
//! consults the subject directly before running an operation.
//!
//! # Kinds
//!
//! - [`ANONYMOUS`]: no authentication performed yet, allows nothing
//! - [`AUTH_DISABLED`]: authentication switched off, allows everything
//! - [`BasicAuthSubject`]: a user that went through a credential check
//!
//! Code that needs to know which kind it holds matches on [`Subject`].
//!
//! # Example
//!
//! ```ignore
//! use kernel_auth::{AccessMode, AuthSubject, Subject};
//!
//! let mut subject: Subject = manager.login("alice", "secret")?;
//! if let Err(violation) = subject.require_write() {
//!     return Err(violation.into());
//! }
//! subject.logout();
//! ```

mod basic;
mod sentinel;

pub use basic::BasicAuthSubject;
pub use sentinel::{AnonymousSubject, AuthDisabledSubject, ANONYMOUS, AUTH_DISABLED};

use crate::access_mode::{AccessMode, AuthorizationViolation};
use crate::authentication::AuthenticationResult;
use crate::error::{SecurityError, SecurityResult};

/// Identity and lifecycle operations on top of an [`AccessMode`].
pub trait AuthSubject: AccessMode {
    /// Drop the identity binding; afterwards the result is `Failure`.
    fn logout(&mut self);

    /// Outcome of the credential check, as updated by later transitions.
    fn authentication_result(&self) -> AuthenticationResult;

    /// Change this subject's own password.
    ///
    /// On success a pending password change is considered honored, so a
    /// subject in `PasswordChangeRequired` becomes fully authorized.
    /// `require_password_change` applies to the next login only.
    fn set_password(
        &mut self,
        password: &str,
        require_password_change: bool,
    ) -> SecurityResult<()>;

    /// Advance `PasswordChangeRequired` to `Success`; no-op in any other state.
    fn set_password_change_no_longer_required(&mut self);

    /// Whether `username` is exactly the name of the bound user.
    fn has_username(&self, username: &str) -> bool;

    /// Name of the bound user, if any.
    fn username(&self) -> Option<&str>;

    /// Check that `username` names an existing user.
    ///
    /// Subjects without access to a user directory always fail.
    fn ensure_user_exists_with_name(&self, username: &str) -> SecurityResult<()> {
        Err(unknown_user(username))
    }
}

pub(crate) fn unknown_user(username: &str) -> SecurityError {
    SecurityError::UnknownUser(format!("User '{}' does not exist.", username))
}

/// Every kind of subject a session can hold.
#[derive(Debug)]
pub enum Subject {
    /// Not authenticated yet.
    Anonymous(AnonymousSubject),
    /// Authentication is disabled.
    AuthDisabled(AuthDisabledSubject),
    /// Went through a credential check.
    Basic(BasicAuthSubject),
}

impl Subject {
    /// The anonymous subject.
    pub fn anonymous() -> Self {
        Subject::Anonymous(ANONYMOUS)
    }

    /// The subject used when authentication is disabled.
    pub fn auth_disabled() -> Self {
        Subject::AuthDisabled(AUTH_DISABLED)
    }

    /// Short name of the subject kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Subject::Anonymous(_) => "anonymous",
            Subject::AuthDisabled(_) => "auth-disabled",
            Subject::Basic(_) => "basic",
        }
    }

    /// Borrow as a [`BasicAuthSubject`], failing for any other kind.
    pub fn as_basic(&self) -> SecurityResult<&BasicAuthSubject> {
        match self {
            Subject::Basic(subject) => Ok(subject),
            other => Err(other.illegal_kind()),
        }
    }

    /// Mutably borrow as a [`BasicAuthSubject`], failing for any other kind.
    pub fn as_basic_mut(&mut self) -> SecurityResult<&mut BasicAuthSubject> {
        match self {
            Subject::Basic(subject) => Ok(subject),
            other => Err(other.illegal_kind()),
        }
    }

    /// Convert into a [`BasicAuthSubject`], failing for any other kind.
    pub fn into_basic(self) -> SecurityResult<BasicAuthSubject> {
        match self {
            Subject::Basic(subject) => Ok(subject),
            other => Err(other.illegal_kind()),
        }
    }

    fn illegal_kind(&self) -> SecurityError {
        SecurityError::IllegalSubjectType {
            expected: "basic",
            actual: self.kind(),
        }
    }

    fn inner(&self) -> &dyn AuthSubject {
        match self {
            Subject::Anonymous(subject) => subject,
            Subject::AuthDisabled(subject) => subject,
            Subject::Basic(subject) => subject,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn AuthSubject {
        match self {
            Subject::Anonymous(subject) => subject,
            Subject::AuthDisabled(subject) => subject,
            Subject::Basic(subject) => subject,
        }
    }
}

impl From<BasicAuthSubject> for Subject {
    fn from(subject: BasicAuthSubject) -> Self {
        Subject::Basic(subject)
    }
}

impl AccessMode for Subject {
    fn allows_reads(&self) -> bool {
        self.inner().allows_reads()
    }

    fn allows_writes(&self) -> bool {
        self.inner().allows_writes()
    }

    fn allows_schema_writes(&self) -> bool {
        self.inner().allows_schema_writes()
    }

    fn is_overridden(&self) -> bool {
        self.inner().is_overridden()
    }

    fn allows_procedure_with(&self, role_names: &[&str]) -> bool {
        self.inner().allows_procedure_with(role_names)
    }

    fn on_violation(&self, message: &str) -> AuthorizationViolation {
        self.inner().on_violation(message)
    }

    fn name(&self) -> &str {
        self.inner().name()
    }
}

impl AuthSubject for Subject {
    fn logout(&mut self) {
        self.inner_mut().logout()
    }

    fn authentication_result(&self) -> AuthenticationResult {
        self.inner().authentication_result()
    }

    fn set_password(
        &mut self,
        password: &str,
        require_password_change: bool,
    ) -> SecurityResult<()> {
        self.inner_mut().set_password(password, require_password_change)
    }

    fn set_password_change_no_longer_required(&mut self) {
        self.inner_mut().set_password_change_no_longer_required()
    }

    fn has_username(&self, username: &str) -> bool {
        self.inner().has_username(username)
    }

    fn username(&self) -> Option<&str> {
        self.inner().username()
    }

    fn ensure_user_exists_with_name(&self, username: &str) -> SecurityResult<()> {
        self.inner().ensure_user_exists_with_name(username)
    }
}
