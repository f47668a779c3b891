//! User record storage.
//!
//! [`InMemoryUserRepository`] backs embedded and test deployments;
//! [`SledUserRepository`] persists users in a sled tree.

use std::collections::HashMap;
use std::path::Path;

use parking_lot::RwLock;
use tracing::warn;

use crate::error::{SecurityError, SecurityResult};
use crate::subject::unknown_user;
use crate::user::User;

const USER_TREE_NAME: &[u8] = b"security:users";

/// Storage for user records.
pub trait UserRepository: Send + Sync {
    /// Look up a user by exact name.
    fn get(&self, username: &str) -> SecurityResult<Option<User>>;

    /// Add a new user; fails if the name is taken.
    ///
    /// A user that could not be made durable is not left behind.
    fn create(&self, user: User) -> SecurityResult<()>;

    /// Replace an existing user; fails with `UnknownUser` if absent.
    fn update(&self, user: User) -> SecurityResult<()>;

    /// Remove a user, returning whether it existed.
    fn delete(&self, username: &str) -> SecurityResult<bool>;

    /// Names of all users, sorted.
    fn names(&self) -> SecurityResult<Vec<String>>;

    /// Whether no users are stored.
    fn is_empty(&self) -> SecurityResult<bool> {
        Ok(self.names()?.is_empty())
    }
}

fn user_exists_error(username: &str) -> SecurityError {
    SecurityError::InvalidArgument(format!("The specified user '{}' already exists.", username))
}

/// Users held in process memory.
#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<String, User>>,
}

impl InMemoryUserRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }
}

impl UserRepository for InMemoryUserRepository {
    fn get(&self, username: &str) -> SecurityResult<Option<User>> {
        Ok(self.users.read().get(username).cloned())
    }

    fn create(&self, user: User) -> SecurityResult<()> {
        let mut users = self.users.write();
        if users.contains_key(user.name()) {
            return Err(user_exists_error(user.name()));
        }
        users.insert(user.name().to_string(), user);
        Ok(())
    }

    fn update(&self, user: User) -> SecurityResult<()> {
        let mut users = self.users.write();
        match users.get_mut(user.name()) {
            Some(existing) => {
                *existing = user;
                Ok(())
            }
            None => Err(unknown_user(user.name())),
        }
    }

    fn delete(&self, username: &str) -> SecurityResult<bool> {
        Ok(self.users.write().remove(username).is_some())
    }

    fn names(&self) -> SecurityResult<Vec<String>> {
        let mut names: Vec<String> = self.users.read().keys().cloned().collect();
        names.sort();
        Ok(names)
    }
}

/// Users persisted in a sled tree, one JSON value per user.
///
/// Every write is flushed before returning, so a successful call means the
/// change survives a restart.
pub struct SledUserRepository {
    tree: sled::Tree,
}

impl SledUserRepository {
    /// Open the user tree inside an existing database.
    pub fn open(db: &sled::Db) -> SecurityResult<Self> {
        let tree = db
            .open_tree(USER_TREE_NAME)
            .map_err(SecurityError::persistence)?;
        Ok(Self { tree })
    }

    /// Open (or create) a database at `path` and the user tree inside it.
    pub fn open_path(path: impl AsRef<Path>) -> SecurityResult<Self> {
        let db = sled::open(path).map_err(SecurityError::persistence)?;
        Self::open(&db)
    }

    fn flush(&self) -> SecurityResult<()> {
        self.tree.flush().map_err(SecurityError::persistence)?;
        Ok(())
    }

    fn serialize_user(user: &User) -> SecurityResult<Vec<u8>> {
        serde_json::to_vec(user)
            .map_err(|e| SecurityError::PersistenceFailure(format!("serialization error: {}", e)))
    }

    fn deserialize_user(bytes: &[u8]) -> SecurityResult<User> {
        serde_json::from_slice(bytes)
            .map_err(|e| SecurityError::PersistenceFailure(format!("deserialization error: {}", e)))
    }
}

impl UserRepository for SledUserRepository {
    fn get(&self, username: &str) -> SecurityResult<Option<User>> {
        self.tree
            .get(username.as_bytes())
            .map_err(SecurityError::persistence)?
            .map(|value| Self::deserialize_user(&value))
            .transpose()
    }

    fn create(&self, user: User) -> SecurityResult<()> {
        let value = Self::serialize_user(&user)?;
        let swapped = self
            .tree
            .compare_and_swap(user.name().as_bytes(), None as Option<&[u8]>, Some(value))
            .map_err(SecurityError::persistence)?;
        if swapped.is_err() {
            return Err(user_exists_error(user.name()));
        }
        // A user that was never made durable must not be visible either.
        if let Err(err) = self.flush() {
            if let Err(rollback) = self.tree.remove(user.name().as_bytes()) {
                warn!(error = %rollback, "failed to roll back unflushed user");
            }
            return Err(err);
        }
        Ok(())
    }

    fn update(&self, user: User) -> SecurityResult<()> {
        let key = user.name().as_bytes();
        let value = Self::serialize_user(&user)?;
        loop {
            let current = self.tree.get(key).map_err(SecurityError::persistence)?;
            let Some(current) = current else {
                return Err(unknown_user(user.name()));
            };
            let swapped = self
                .tree
                .compare_and_swap(key, Some(current), Some(value.clone()))
                .map_err(SecurityError::persistence)?;
            if swapped.is_ok() {
                return self.flush();
            }
        }
    }

    fn delete(&self, username: &str) -> SecurityResult<bool> {
        let removed = self
            .tree
            .remove(username.as_bytes())
            .map_err(SecurityError::persistence)?;
        self.flush()?;
        Ok(removed.is_some())
    }

    fn names(&self) -> SecurityResult<Vec<String>> {
        let mut names = Vec::new();
        for result in self.tree.iter().keys() {
            let key = result.map_err(SecurityError::persistence)?;
            names.push(String::from_utf8_lossy(&key).into_owned());
        }
        Ok(names)
    }
}
