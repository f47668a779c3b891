//! User records as seen by the auth manager.
//!
//! Subjects treat a [`User`] as opaque apart from its name; credential
//! details only matter to the [`crate::BasicAuthManager`].

use serde::{Deserialize, Serialize};

/// Key-derivation context for credential digests.
const CREDENTIAL_CONTEXT: &str = "kernel-auth 2024-01-01 user credential v1";

/// Digest of a user's password.
///
/// The digest is bound to the username so two users with the same password
/// never share a credential value.
///
/// This is a single fast keyed hash with no per-user salt or work factor, so
/// it does not resist offline guessing. It is not suitable for production
/// password storage; deployments that need that should provide their own
/// [`crate::UserRepository`] and [`crate::PasswordManager`] backed by a
/// slow password hash.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    digest: [u8; 32],
}

impl Credential {
    /// Derive the credential for `password` belonging to `username`.
    pub fn for_password(username: &str, password: &str) -> Self {
        Self {
            digest: *Self::derive(username, password).as_bytes(),
        }
    }

    /// Check whether `password` produces this credential for `username`.
    pub fn matches(&self, username: &str, password: &str) -> bool {
        // blake3::Hash equality is constant time.
        blake3::Hash::from(self.digest) == Self::derive(username, password)
    }

    fn derive(username: &str, password: &str) -> blake3::Hash {
        let mut hasher = blake3::Hasher::new_derive_key(CREDENTIAL_CONTEXT);
        hasher.update(&(username.len() as u64).to_le_bytes());
        hasher.update(username.as_bytes());
        hasher.update(password.as_bytes());
        hasher.finalize()
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// A user known to the credential store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    name: String,
    credential: Credential,
    password_change_required: bool,
}

impl User {
    /// Create a user with the given credential.
    pub fn new(name: impl Into<String>, credential: Credential) -> Self {
        Self {
            name: name.into(),
            credential,
            password_change_required: false,
        }
    }

    /// Create a user whose credential is derived from `password`.
    pub fn with_password(name: impl Into<String>, password: &str) -> Self {
        let name = name.into();
        let credential = Credential::for_password(&name, password);
        Self::new(name, credential)
    }

    /// Set whether the user must change password on next login.
    pub fn with_password_change_required(mut self, required: bool) -> Self {
        self.password_change_required = required;
        self
    }

    /// Replace the credential, keeping everything else.
    pub fn with_credential(mut self, credential: Credential) -> Self {
        self.credential = credential;
        self
    }

    /// Username.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stored credential.
    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    /// Whether a password change is pending.
    pub fn password_change_required(&self) -> bool {
        self.password_change_required
    }

    /// Check `password` against the stored credential.
    pub fn verify_password(&self, password: &str) -> bool {
        self.credential.matches(&self.name, password)
    }
}
