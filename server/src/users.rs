//! User accounts, credential checks and the score leaderboard
//!
//! The in-memory list is authoritative while the host runs. Every mutation
//! is written through to the [`UserStore`] immediately; if that write fails
//! the change is kept in memory and the failure is handed back to the
//! caller as [`Persistence::MemoryOnly`] so it can be logged.

use crate::error::{StorageError, UserError};
use crate::store::UserStore;
use sha2::{Digest, Sha256};
use shared::{is_reserved_username, AccountSummary};

/// A registered player account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub username: String,
    /// Hex SHA-256 of the cleartext password followed by `created_at`
    pub password_hash: String,
    /// Account creation time in milliseconds; doubles as the hash salt
    pub created_at: i64,
    pub score: u32,
}

impl User {
    pub fn summary(&self) -> AccountSummary {
        AccountSummary {
            username: self.username.clone(),
            score: self.score,
            created_at: self.created_at,
        }
    }
}

/// Outcome of writing a committed change through to the store
#[must_use]
#[derive(Debug)]
pub enum Persistence {
    Stored,
    MemoryOnly(StorageError),
}

impl From<Result<(), StorageError>> for Persistence {
    fn from(result: Result<(), StorageError>) -> Self {
        match result {
            Ok(()) => Persistence::Stored,
            Err(e) => Persistence::MemoryOnly(e),
        }
    }
}

/// Salted password digest: `hex(sha256(password ++ timestamp))`
pub fn hash_password(password: &str, timestamp: i64) -> String {
    let salted = format!("{}{}", password, timestamp);
    hex::encode(Sha256::digest(salted.as_bytes()))
}

/// All known accounts in insertion order
pub struct UserList {
    users: Vec<User>,
    store: Box<dyn UserStore>,
}

impl UserList {
    /// Creates an empty list backed by `store`; call [`reload`](Self::reload) to populate it
    pub fn new(store: Box<dyn UserStore>) -> Self {
        Self {
            users: Vec::new(),
            store,
        }
    }

    /// Replaces the in-memory list with the store's contents
    ///
    /// On failure the current list is left untouched.
    pub fn reload(&mut self) -> Result<usize, StorageError> {
        self.users = self.store.load_users()?;
        Ok(self.users.len())
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Case-sensitive exact lookup
    pub fn get(&self, username: &str) -> Option<&User> {
        self.users.iter().find(|user| user.username == username)
    }

    /// Creates an account with score 0
    pub fn register(
        &mut self,
        username: &str,
        password: &str,
        timestamp: i64,
    ) -> Result<Persistence, UserError> {
        if is_reserved_username(username) {
            return Err(UserError::ReservedName(username.to_string()));
        }
        if self.get(username).is_some() {
            return Err(UserError::DuplicateUser(username.to_string()));
        }

        let user = User {
            username: username.to_string(),
            password_hash: hash_password(password, timestamp),
            created_at: timestamp,
            score: 0,
        };
        let persistence = self.store.insert_user(&user).into();
        self.users.push(user);

        Ok(persistence)
    }

    /// Returns the account if `password` matches the stored salted hash
    pub fn validate_login(&self, username: &str, password: &str) -> Result<&User, UserError> {
        let user = self.get(username).ok_or(UserError::AuthFailure)?;

        if hash_password(password, user.created_at) == user.password_hash {
            Ok(user)
        } else {
            Err(UserError::AuthFailure)
        }
    }

    /// Adds points to a user's score; `None` if the user does not exist
    pub fn award_points(&mut self, username: &str, points: u32) -> Option<Persistence> {
        let user = self
            .users
            .iter_mut()
            .find(|user| user.username == username)?;
        user.score = user.score.saturating_add(points);

        Some(self.store.update_user(user).into())
    }

    /// 1-based leaderboard position, or -1 for an unknown user
    pub fn rank(&self, username: &str) -> i64 {
        self.ranked()
            .iter()
            .position(|user| user.username == username)
            .map(|index| index as i64 + 1)
            .unwrap_or(-1)
    }

    /// Up to `n` users by descending score; ties keep insertion order
    pub fn top(&self, n: usize) -> Vec<&User> {
        let mut ranked = self.ranked();
        ranked.truncate(n);
        ranked
    }

    fn ranked(&self) -> Vec<&User> {
        let mut ranked: Vec<&User> = self.users.iter().collect();
        // stable: equal scores stay in insertion order
        ranked.sort_by(|a, b| b.score.cmp(&a.score));
        ranked
    }
}
