//! Subject for a user that went through a credential check.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::access_mode::{AccessMode, AuthorizationViolation, StaticAccessMode};
use crate::authentication::AuthenticationResult;
use crate::error::{SecurityError, SecurityResult};
use crate::manager::PasswordManager;
use crate::user::User;

use super::{unknown_user, AuthSubject};

/// Name reported by a subject with no bound user.
const UNBOUND_NAME: &str = "<no user>";

/// Session state of an authenticated (or failed) login.
///
/// | result                   | access mode           |
/// |--------------------------|-----------------------|
/// | `Success`                | `FULL`                |
/// | `PasswordChangeRequired` | `CREDENTIALS_EXPIRED` |
/// | `Failure`                | `NONE`                |
///
/// The mode is always recomputed from the result on every transition,
/// logout included.
pub struct BasicAuthSubject {
    manager: Arc<dyn PasswordManager>,
    user: Option<User>,
    result: AuthenticationResult,
    mode: StaticAccessMode,
}

impl BasicAuthSubject {
    /// Bind `user` to the outcome of its credential check.
    pub fn new(
        manager: Arc<dyn PasswordManager>,
        user: User,
        result: AuthenticationResult,
    ) -> Self {
        Self {
            manager,
            user: Some(user),
            result,
            mode: result.access_mode(),
        }
    }

    /// A failed login for a name that matched no user.
    pub(crate) fn unbound(manager: Arc<dyn PasswordManager>) -> Self {
        Self {
            manager,
            user: None,
            result: AuthenticationResult::Failure,
            mode: AuthenticationResult::Failure.access_mode(),
        }
    }

    /// The bound user, cleared on logout.
    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    /// The password manager password changes are delegated to.
    pub fn manager(&self) -> &Arc<dyn PasswordManager> {
        &self.manager
    }

    /// Current capability bundle.
    pub fn access_mode(&self) -> StaticAccessMode {
        self.mode
    }

    fn transition(&mut self, result: AuthenticationResult) {
        self.result = result;
        self.mode = result.access_mode();
    }
}

impl std::fmt::Debug for BasicAuthSubject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicAuthSubject")
            .field("user", &self.username())
            .field("result", &self.result)
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

impl AccessMode for BasicAuthSubject {
    fn allows_reads(&self) -> bool {
        self.mode.allows_reads()
    }

    fn allows_writes(&self) -> bool {
        self.mode.allows_writes()
    }

    fn allows_schema_writes(&self) -> bool {
        self.mode.allows_schema_writes()
    }

    fn is_overridden(&self) -> bool {
        self.mode.is_overridden()
    }

    // Procedure-level role checks happen where procedures are resolved.
    fn allows_procedure_with(&self, _role_names: &[&str]) -> bool {
        true
    }

    fn on_violation(&self, message: &str) -> AuthorizationViolation {
        self.mode.on_violation(message)
    }

    fn name(&self) -> &str {
        self.username().unwrap_or(UNBOUND_NAME)
    }
}

impl AuthSubject for BasicAuthSubject {
    #[instrument(skip(self), fields(user = self.name()))]
    fn logout(&mut self) {
        if self.user.take().is_some() {
            info!("subject logged out");
        }
        self.transition(AuthenticationResult::Failure);
    }

    fn authentication_result(&self) -> AuthenticationResult {
        self.result
    }

    #[instrument(skip(self, password), fields(user = self.name(), result = %self.result))]
    fn set_password(
        &mut self,
        password: &str,
        require_password_change: bool,
    ) -> SecurityResult<()> {
        let username = match self.user.as_ref() {
            Some(user) => user.name().to_string(),
            None => {
                return Err(SecurityError::AuthorizationDenied(
                    "A subject without a user cannot change password".to_string(),
                ))
            }
        };
        if self.result == AuthenticationResult::Failure {
            warn!("password change refused for unauthenticated subject");
            return Err(SecurityError::AuthorizationDenied(format!(
                "User '{}' is not authenticated and cannot change password.",
                username
            )));
        }

        self.manager
            .set_password(&*self, &username, password, require_password_change)?;
        debug!(require_password_change, "password changed");

        self.set_password_change_no_longer_required();
        Ok(())
    }

    fn set_password_change_no_longer_required(&mut self) {
        if self.result == AuthenticationResult::PasswordChangeRequired {
            debug!(user = self.name(), "password change honored, granting full access");
            self.transition(AuthenticationResult::Success);
        }
    }

    fn has_username(&self, username: &str) -> bool {
        self.username() == Some(username)
    }

    fn username(&self) -> Option<&str> {
        self.user.as_ref().map(User::name)
    }

    fn ensure_user_exists_with_name(&self, username: &str) -> SecurityResult<()> {
        match self.manager.user_directory() {
            Some(directory) if directory.user_exists(username) => Ok(()),
            _ => Err(unknown_user(username)),
        }
    }
}
