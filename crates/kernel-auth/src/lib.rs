//! Kernel Auth - Session subjects and access modes for the database kernel.
//!
//! Every session carries a subject. Before the kernel runs an operation it
//! asks the subject whether reads, writes, or schema changes are allowed, and
//! the subject answers from an access mode derived from its authentication
//! state. A user whose password must be rotated holds no capabilities until
//! the rotation succeeds.
//!
//! # Example
//!
//! ```ignore
//! use kernel_auth::{AccessMode, AuthConfig, AuthSubject, BasicAuthManager};
//!
//! let manager = BasicAuthManager::open(AuthConfig::new())?;
//! let mut subject = manager.login("admin", "admin")?;
//!
//! // The initial user must change its password first.
//! assert!(subject.require_read().is_err());
//! subject.set_password("correct horse", false)?;
//! assert!(subject.require_read().is_ok());
//! ```

pub mod access_mode;
pub mod authentication;
pub mod config;
pub mod error;
pub mod manager;
pub mod repository;
pub mod subject;
pub mod user;

pub use access_mode::{
    AccessMode, AccessModeSnapshot, AuthorizationViolation, OverriddenAccessMode,
    StaticAccessMode, ViolationKind, CREDENTIALS_EXPIRED_MESSAGE,
};
pub use authentication::AuthenticationResult;
pub use config::AuthConfig;
pub use error::{SecurityError, SecurityResult};
pub use manager::{BasicAuthManager, PasswordManager, UserDirectory};
pub use repository::{InMemoryUserRepository, SledUserRepository, UserRepository};
pub use subject::{
    AnonymousSubject, AuthDisabledSubject, AuthSubject, BasicAuthSubject, Subject, ANONYMOUS,
    AUTH_DISABLED,
};
pub use user::{Credential, User};
