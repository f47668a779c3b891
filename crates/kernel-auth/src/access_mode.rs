//! Capability bundles consulted before every kernel operation.
//!
//! An [`AccessMode`] answers three questions for the operation a session is
//! about to run: may it read, may it write data, may it change the schema.
//! Canonical bundles live on [`StaticAccessMode`]; subjects derive one of them
//! from their authentication state and expose it through the same trait.

use thiserror::Error;

/// Message carried by violations raised under [`StaticAccessMode::CREDENTIALS_EXPIRED`].
pub const CREDENTIALS_EXPIRED_MESSAGE: &str =
    "The credentials you provided were valid, but must be changed before you can use this instance.";

/// What kind of refusal a violation represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViolationKind {
    /// The mode does not grant the capability.
    Unauthorized,
    /// The mode withholds everything until the password is rotated.
    CredentialsExpired,
}

/// A refused operation, built by [`AccessMode::on_violation`].
///
/// Constructing one has no side effects; the caller decides whether to
/// return it, log it, or convert it into a [`crate::SecurityError`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct AuthorizationViolation {
    kind: ViolationKind,
    message: String,
}

impl AuthorizationViolation {
    /// Create a violation of the given kind.
    pub fn new(kind: ViolationKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Create a plain authorization violation.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ViolationKind::Unauthorized, message)
    }

    /// Create the violation raised while a password change is pending.
    pub fn credentials_expired() -> Self {
        Self::new(ViolationKind::CredentialsExpired, CREDENTIALS_EXPIRED_MESSAGE)
    }

    /// Kind of refusal.
    pub fn kind(&self) -> ViolationKind {
        self.kind
    }

    /// Human readable message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Capability predicates shared by access modes and subjects.
pub trait AccessMode {
    /// Whether data may be read.
    fn allows_reads(&self) -> bool;

    /// Whether data may be written.
    fn allows_writes(&self) -> bool;

    /// Whether the schema (indexes, constraints, labels) may be changed.
    fn allows_schema_writes(&self) -> bool;

    /// Whether this mode is an administrative override of a baseline mode.
    fn is_overridden(&self) -> bool;

    /// Whether a procedure restricted to `role_names` may be invoked.
    fn allows_procedure_with(&self, role_names: &[&str]) -> bool;

    /// Build the violation to report when a check against this mode fails.
    fn on_violation(&self, message: &str) -> AuthorizationViolation;

    /// Display name of the mode (or of the subject carrying it).
    fn name(&self) -> &str;

    /// Take an owned copy of the current capabilities.
    fn snapshot(&self) -> AccessModeSnapshot {
        AccessModeSnapshot::capture(self)
    }

    /// Require read capability.
    fn require_read(&self) -> Result<(), AuthorizationViolation> {
        if self.allows_reads() {
            Ok(())
        } else {
            Err(self.on_violation(&format!(
                "Read operations are not allowed for '{}'.",
                self.name()
            )))
        }
    }

    /// Require write capability.
    fn require_write(&self) -> Result<(), AuthorizationViolation> {
        if self.allows_writes() {
            Ok(())
        } else {
            Err(self.on_violation(&format!(
                "Write operations are not allowed for '{}'.",
                self.name()
            )))
        }
    }

    /// Require schema write capability.
    fn require_schema_write(&self) -> Result<(), AuthorizationViolation> {
        if self.allows_schema_writes() {
            Ok(())
        } else {
            Err(self.on_violation(&format!(
                "Schema operations are not allowed for '{}'.",
                self.name()
            )))
        }
    }
}

/// A canonical, immutable capability bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StaticAccessMode {
    reads: bool,
    writes: bool,
    schema_writes: bool,
    overridden: bool,
    violation: ViolationKind,
    name: &'static str,
}

impl StaticAccessMode {
    /// No reading or writing allowed.
    pub const NONE: Self = Self::new("none", false, false, false, false);

    /// Allows reading data.
    pub const READ: Self = Self::new("read", true, false, false, false);

    /// Allows writing data, but not reading it back.
    pub const WRITE_ONLY: Self = Self::new("write-only", false, true, false, false);

    /// Allows reading and writing data, no schema changes.
    pub const WRITE: Self = Self::new("write", true, true, false, false);

    /// Allows all operations.
    pub const FULL: Self = Self::new("full", true, true, true, false);

    /// Read access granted by an administrative override.
    pub const OVERRIDE_READ: Self = Self::new("override-read", true, false, false, true);

    /// Read and write access granted by an administrative override.
    pub const OVERRIDE_WRITE: Self = Self::new("override-write", true, true, false, true);

    /// Full access granted by an administrative override.
    pub const OVERRIDE_SCHEMA: Self = Self::new("override-schema", true, true, true, true);

    /// Credentials were accepted but must be changed; nothing is allowed.
    pub const CREDENTIALS_EXPIRED: Self = Self {
        reads: false,
        writes: false,
        schema_writes: false,
        overridden: false,
        violation: ViolationKind::CredentialsExpired,
        name: "credentials-expired",
    };

    const fn new(
        name: &'static str,
        reads: bool,
        writes: bool,
        schema_writes: bool,
        overridden: bool,
    ) -> Self {
        Self {
            reads,
            writes,
            schema_writes,
            overridden,
            violation: ViolationKind::Unauthorized,
            name,
        }
    }
}

impl AccessMode for StaticAccessMode {
    fn allows_reads(&self) -> bool {
        self.reads
    }

    fn allows_writes(&self) -> bool {
        self.writes
    }

    fn allows_schema_writes(&self) -> bool {
        self.schema_writes
    }

    fn is_overridden(&self) -> bool {
        self.overridden
    }

    // Role gating is decided by subjects, never by a bare bundle.
    fn allows_procedure_with(&self, _role_names: &[&str]) -> bool {
        false
    }

    fn on_violation(&self, message: &str) -> AuthorizationViolation {
        match self.violation {
            ViolationKind::Unauthorized => AuthorizationViolation::unauthorized(message),
            ViolationKind::CredentialsExpired => AuthorizationViolation::credentials_expired(),
        }
    }

    fn name(&self) -> &str {
        self.name
    }
}

impl std::fmt::Display for StaticAccessMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Owned copy of a mode's capabilities at one point in time.
///
/// Later changes to the subject the snapshot was taken from do not show
/// through. Procedure access is captured without role names, which is exact
/// for every mode in this crate since none of them gate on roles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessModeSnapshot {
    reads: bool,
    writes: bool,
    schema_writes: bool,
    overridden: bool,
    procedures: bool,
    violation: ViolationKind,
    name: String,
}

impl AccessModeSnapshot {
    /// Capture the capabilities of `mode`.
    pub fn capture<M: AccessMode + ?Sized>(mode: &M) -> Self {
        Self {
            reads: mode.allows_reads(),
            writes: mode.allows_writes(),
            schema_writes: mode.allows_schema_writes(),
            overridden: mode.is_overridden(),
            procedures: mode.allows_procedure_with(&[]),
            violation: mode.on_violation("").kind(),
            name: mode.name().to_string(),
        }
    }
}

impl AccessMode for AccessModeSnapshot {
    fn allows_reads(&self) -> bool {
        self.reads
    }

    fn allows_writes(&self) -> bool {
        self.writes
    }

    fn allows_schema_writes(&self) -> bool {
        self.schema_writes
    }

    fn is_overridden(&self) -> bool {
        self.overridden
    }

    fn allows_procedure_with(&self, _role_names: &[&str]) -> bool {
        self.procedures
    }

    fn on_violation(&self, message: &str) -> AuthorizationViolation {
        match self.violation {
            ViolationKind::Unauthorized => AuthorizationViolation::unauthorized(message),
            ViolationKind::CredentialsExpired => AuthorizationViolation::credentials_expired(),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn snapshot(&self) -> AccessModeSnapshot {
        self.clone()
    }
}

/// A baseline mode whose capabilities are temporarily replaced by an override.
///
/// Used when the kernel runs an operation on a session's behalf with
/// different rights than the session itself holds (e.g. a procedure declared
/// to run with schema access). Violations are still reported the way the
/// baseline would report them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverriddenAccessMode {
    original: AccessModeSnapshot,
    overriding: StaticAccessMode,
    name: String,
}

impl OverriddenAccessMode {
    /// Override the capabilities of `original` with `overriding`.
    pub fn new<M: AccessMode + ?Sized>(original: &M, overriding: StaticAccessMode) -> Self {
        let original = original.snapshot();
        let name = format!("{} overridden by {}", original.name(), overriding.name());
        Self {
            original,
            overriding,
            name,
        }
    }

    /// The mode in effect before the override.
    pub fn original(&self) -> &AccessModeSnapshot {
        &self.original
    }

    /// The bundle that replaced it.
    pub fn overriding(&self) -> StaticAccessMode {
        self.overriding
    }
}

impl AccessMode for OverriddenAccessMode {
    fn allows_reads(&self) -> bool {
        self.overriding.allows_reads()
    }

    fn allows_writes(&self) -> bool {
        self.overriding.allows_writes()
    }

    fn allows_schema_writes(&self) -> bool {
        self.overriding.allows_schema_writes()
    }

    fn is_overridden(&self) -> bool {
        true
    }

    fn allows_procedure_with(&self, role_names: &[&str]) -> bool {
        self.original.allows_procedure_with(role_names)
    }

    fn on_violation(&self, message: &str) -> AuthorizationViolation {
        self.original.on_violation(message)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
