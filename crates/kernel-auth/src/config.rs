//! Authentication configuration.

use std::path::PathBuf;

use tracing::warn;

/// Name of the user created when the store is empty.
pub const DEFAULT_INITIAL_USER: &str = "admin";

/// Password of the user created when the store is empty.
pub const DEFAULT_INITIAL_PASSWORD: &str = "admin";

/// Environment variable toggling authentication (`true`/`false`).
pub const ENV_AUTH_ENABLED: &str = "KERNEL_AUTH_ENABLED";

/// Environment variable overriding the initial user name.
pub const ENV_INITIAL_USER: &str = "KERNEL_AUTH_INITIAL_USER";

/// Environment variable overriding the initial user's password.
pub const ENV_INITIAL_PASSWORD: &str = "KERNEL_AUTH_INITIAL_PASSWORD";

/// Environment variable pointing at the user store directory.
pub const ENV_STORAGE_PATH: &str = "KERNEL_AUTH_STORAGE_PATH";

/// Authentication configuration.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Whether credentials are checked at all. When false every login yields
    /// the auth-disabled subject.
    pub auth_enabled: bool,

    /// User created on first start.
    pub initial_user: String,

    /// Password of the initial user.
    pub initial_password: String,

    /// Whether the initial user must change password on first login.
    pub require_initial_password_change: bool,

    /// Directory of the sled user store. None keeps users in memory.
    pub storage_path: Option<PathBuf>,
}

impl AuthConfig {
    /// Create the default configuration: auth enabled, in-memory store.
    pub fn new() -> Self {
        Self {
            auth_enabled: true,
            initial_user: DEFAULT_INITIAL_USER.to_string(),
            initial_password: DEFAULT_INITIAL_PASSWORD.to_string(),
            require_initial_password_change: true,
            storage_path: None,
        }
    }

    /// Default configuration overlaid with `KERNEL_AUTH_*` environment variables.
    pub fn from_env() -> Self {
        Self::new().with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Overlay values returned by `lookup` for the `KERNEL_AUTH_*` keys.
    pub fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(value) = lookup(ENV_AUTH_ENABLED) {
            match parse_bool(&value) {
                Some(enabled) => self.auth_enabled = enabled,
                None => warn!(key = ENV_AUTH_ENABLED, %value, "ignoring invalid boolean"),
            }
        }
        if let Some(user) = lookup(ENV_INITIAL_USER).filter(|v| !v.trim().is_empty()) {
            self.initial_user = user.trim().to_string();
        }
        if let Some(password) = lookup(ENV_INITIAL_PASSWORD).filter(|v| !v.is_empty()) {
            self.initial_password = password;
        }
        if let Some(path) = lookup(ENV_STORAGE_PATH).filter(|v| !v.trim().is_empty()) {
            self.storage_path = Some(PathBuf::from(path.trim()));
        }
        self
    }

    /// Enable or disable authentication.
    pub fn with_auth_enabled(mut self, enabled: bool) -> Self {
        self.auth_enabled = enabled;
        self
    }

    /// Disable authentication.
    pub fn without_auth(self) -> Self {
        self.with_auth_enabled(false)
    }

    /// Set the initial user's name and password.
    pub fn with_initial_user(
        mut self,
        name: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.initial_user = name.into();
        self.initial_password = password.into();
        self
    }

    /// Set whether the initial user must rotate its password.
    pub fn with_initial_password_change(mut self, required: bool) -> Self {
        self.require_initial_password_change = required;
        self
    }

    /// Persist users in a sled store under `path`.
    pub fn with_storage_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.storage_path = Some(path.into());
        self
    }

    /// Check if users are persisted.
    pub fn is_persistent(&self) -> bool {
        self.storage_path.is_some()
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
