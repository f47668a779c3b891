//! Credential checks and password management.
//!
//! Subjects never validate or store passwords themselves; they hand the
//! request to a [`PasswordManager`]. [`BasicAuthManager`] is the manager the
//! kernel ships with, backed by a [`UserRepository`].

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::authentication::AuthenticationResult;
use crate::config::AuthConfig;
use crate::error::{SecurityError, SecurityResult};
use crate::repository::{InMemoryUserRepository, SledUserRepository, UserRepository};
use crate::subject::{unknown_user, AuthSubject, BasicAuthSubject, Subject};
use crate::user::{Credential, User};

/// Performs password changes requested by subjects.
pub trait PasswordManager: Send + Sync {
    /// Change the password of `username` on behalf of `subject`.
    ///
    /// Fails with `InvalidCredential` if the password is rejected and with
    /// `PersistenceFailure` if the change could not be stored.
    fn set_password(
        &self,
        subject: &dyn AuthSubject,
        username: &str,
        password: &str,
        require_password_change: bool,
    ) -> SecurityResult<()>;

    /// Directory of known users, if this manager has one.
    fn user_directory(&self) -> Option<&dyn UserDirectory> {
        None
    }
}

/// Answers whether a user exists.
pub trait UserDirectory {
    /// Whether `username` names a known user.
    fn user_exists(&self, username: &str) -> bool;
}

/// Repository-backed authentication manager.
pub struct BasicAuthManager {
    repository: Arc<dyn UserRepository>,
    config: AuthConfig,
}

impl BasicAuthManager {
    /// Create a manager over an existing repository.
    pub fn new(repository: Arc<dyn UserRepository>, config: AuthConfig) -> Self {
        Self { repository, config }
    }

    /// Build the repository described by `config` and create the initial
    /// user if the store is empty.
    pub fn open(config: AuthConfig) -> SecurityResult<Arc<Self>> {
        let repository: Arc<dyn UserRepository> = match &config.storage_path {
            Some(path) => Arc::new(SledUserRepository::open_path(path)?),
            None => Arc::new(InMemoryUserRepository::new()),
        };
        let manager = Arc::new(Self::new(repository, config));
        manager.initialize()?;
        Ok(manager)
    }

    /// The active configuration.
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Create the configured initial user when no users exist yet.
    #[instrument(skip(self))]
    pub fn initialize(&self) -> SecurityResult<()> {
        if !self.repository.is_empty()? {
            debug!("user store already populated");
            return Ok(());
        }
        self.new_user(
            &self.config.initial_user,
            &self.config.initial_password,
            self.config.require_initial_password_change,
        )?;
        info!(user = %self.config.initial_user, "created initial user");
        Ok(())
    }

    /// Check `password` for `username` and build the session subject.
    ///
    /// With authentication disabled this always yields the auth-disabled
    /// subject. An unknown user or a wrong password yields a subject in
    /// `Failure`.
    #[instrument(skip(self, password))]
    pub fn login(self: &Arc<Self>, username: &str, password: &str) -> SecurityResult<Subject> {
        if !self.config.auth_enabled {
            return Ok(Subject::auth_disabled());
        }

        let manager: Arc<dyn PasswordManager> = self.clone();
        let user = match self.repository.get(username)? {
            Some(user) => user,
            None => {
                warn!("login attempt for unknown user");
                return Ok(BasicAuthSubject::unbound(manager).into());
            }
        };

        let result = if !user.verify_password(password) {
            AuthenticationResult::Failure
        } else if user.password_change_required() {
            AuthenticationResult::PasswordChangeRequired
        } else {
            AuthenticationResult::Success
        };

        match result {
            AuthenticationResult::Failure => warn!("credential check failed"),
            _ => info!(%result, "credential check passed"),
        }
        Ok(BasicAuthSubject::new(manager, user, result).into())
    }

    /// Create a user.
    #[instrument(skip(self, password))]
    pub fn new_user(
        &self,
        username: &str,
        password: &str,
        require_password_change: bool,
    ) -> SecurityResult<User> {
        if username.trim().is_empty() {
            return Err(SecurityError::InvalidArgument(
                "The provided username is empty.".to_string(),
            ));
        }
        validate_password(password)?;

        let user = User::with_password(username, password)
            .with_password_change_required(require_password_change);
        self.repository.create(user.clone())?;
        debug!("user created");
        Ok(user)
    }

    /// Remove a user.
    #[instrument(skip(self))]
    pub fn delete_user(&self, username: &str) -> SecurityResult<()> {
        if self.repository.delete(username)? {
            info!("user deleted");
            Ok(())
        } else {
            Err(unknown_user(username))
        }
    }

    /// Fetch a user record.
    pub fn get_user(&self, username: &str) -> SecurityResult<User> {
        self.repository
            .get(username)?
            .ok_or_else(|| unknown_user(username))
    }

    /// Names of all users.
    pub fn user_names(&self) -> SecurityResult<Vec<String>> {
        self.repository.names()
    }
}

impl PasswordManager for BasicAuthManager {
    #[instrument(skip(self, subject, password))]
    fn set_password(
        &self,
        subject: &dyn AuthSubject,
        username: &str,
        password: &str,
        require_password_change: bool,
    ) -> SecurityResult<()> {
        if !subject.has_username(username)
            || subject.authentication_result() == AuthenticationResult::Failure
        {
            return Err(SecurityError::AuthorizationDenied(format!(
                "Invalid attempt to change the password for user '{}'.",
                username
            )));
        }
        validate_password(password)?;

        let user = self.get_user(username)?;
        if user.verify_password(password) {
            return Err(SecurityError::InvalidCredential(
                "Old password and new password cannot be the same.".to_string(),
            ));
        }

        let updated = user
            .with_credential(Credential::for_password(username, password))
            .with_password_change_required(require_password_change);
        self.repository.update(updated)?;
        info!("password updated");
        Ok(())
    }

    fn user_directory(&self) -> Option<&dyn UserDirectory> {
        Some(self)
    }
}

impl UserDirectory for BasicAuthManager {
    fn user_exists(&self, username: &str) -> bool {
        match self.repository.get(username) {
            Ok(user) => user.is_some(),
            Err(err) => {
                warn!(error = %err, "user lookup failed");
                false
            }
        }
    }
}

fn validate_password(password: &str) -> SecurityResult<()> {
    if password.is_empty() {
        return Err(SecurityError::InvalidCredential(
            "A password cannot be empty.".to_string(),
        ));
    }
    Ok(())
}
