use sha2::{Digest, Sha256};
use tracing::{info, warn};
use uuid::Uuid;

use std::collections::HashMap;

use crate::error::{Error, Result};

#[derive(Debug)]
struct StoredPassword {
    salt: [u8; 16],
    hash: [u8; 32],
}

impl StoredPassword {
    fn new(password: &str) -> Self {
        let salt = Uuid::new_v4().into_bytes();
        Self {
            salt,
            hash: hash(&salt, password),
        }
    }

    fn matches(&self, password: &str) -> bool {
        let candidate = hash(&self.salt, password);
        // Compare every byte so timing does not depend on where they differ.
        candidate
            .iter()
            .zip(&self.hash)
            .fold(0, |acc, (a, b)| acc | (a ^ b))
            == 0
    }
}

fn hash(salt: &[u8], password: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    hasher.finalize().into()
}

/// Proof that a user logged in, handed to the menu shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    username: String,
}

impl Session {
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }
}

/// Holds user accounts for the lifetime of the process.
///
/// Passwords are kept only as salted SHA-256 hashes. Nothing is written to
/// disk: the store starts empty on every run, and the first account is
/// created interactively.
#[derive(Debug, Default)]
pub struct Credentials {
    users: HashMap<String, StoredPassword>,
}

impl Credentials {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.users.len()
    }

    #[must_use]
    pub fn contains(&self, username: &str) -> bool {
        self.users.contains_key(username)
    }

    /// Adds a new account.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCredentials`] if either the username or the
    /// password is empty, and [`Error::UserExists`] if the username is taken.
    pub fn add_user(&mut self, username: &str, password: &str) -> Result<()> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(Error::InvalidCredentials);
        }
        if self.contains(username) {
            return Err(Error::UserExists(username.to_string()));
        }
        self.users
            .insert(username.to_string(), StoredPassword::new(password));
        info!(username, "user added");
        Ok(())
    }

    /// Checks `password` against the stored hash for `username`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCredentials`] if there is no such user or the
    /// password does not match.
    pub fn authenticate(&self, username: &str, password: &str) -> Result<Session> {
        match self.users.get(username) {
            Some(stored) if stored.matches(password) => {
                info!(username, "user logged in");
                Ok(Session {
                    username: username.to_string(),
                })
            }
            _ => {
                warn!(username, "failed login");
                Err(Error::InvalidCredentials)
            }
        }
    }
}
