//! Durable storage for user accounts and the word corpus
//!
//! The game engine only depends on the [`UserStore`] contract. The shipped
//! implementation is [`SqliteStore`], which uses the same two-table layout
//! as existing game databases so they can be opened unchanged.

use crate::error::StorageError;
use crate::users::User;
use crate::words::WordEntry;
use rusqlite::{params, Connection};
use std::path::Path;

/// Language columns of the `words` table, in variant order
pub const WORD_COLUMNS: [&str; 9] = [
    "wordGer", "wordEng", "wordUkr", "wordMon", "wordSpa", "wordPor", "wordKen", "wordNig",
    "wordFre",
];

/// Read/write contract the engine needs from persistence
///
/// Calls are made sequentially from the game loop, never concurrently.
pub trait UserStore: Send {
    fn load_users(&self) -> Result<Vec<User>, StorageError>;

    fn insert_user(&self, user: &User) -> Result<(), StorageError>;

    /// Writes back the password hash and score of an existing user
    fn update_user(&self, user: &User) -> Result<(), StorageError>;

    fn load_words(&self) -> Result<Vec<WordEntry>, StorageError>;
}

/// SQLite-backed store
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens (or creates) a database file, creating missing parent directories
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        create_tables(&conn)?;
        Ok(Self { conn })
    }

    /// Opens a private in-memory database
    pub fn open_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        create_tables(&conn)?;
        Ok(Self { conn })
    }

    /// Adds one concept to the corpus; missing languages are stored empty
    pub fn insert_word(&self, variants: &[&str]) -> Result<(), StorageError> {
        let mut row = [""; WORD_COLUMNS.len()];
        for (slot, variant) in row.iter_mut().zip(variants) {
            *slot = *variant;
        }

        self.conn.execute(
            &format!(
                "INSERT INTO words ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                WORD_COLUMNS.join(", ")
            ),
            params![row[0], row[1], row[2], row[3], row[4], row[5], row[6], row[7], row[8]],
        )?;
        Ok(())
    }
}

impl UserStore for SqliteStore {
    fn load_users(&self) -> Result<Vec<User>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT username, password, userCreatedTimestamp, score FROM users ORDER BY rowid",
        )?;

        let users = stmt
            .query_map([], |row| {
                Ok(User {
                    username: row.get(0)?,
                    password_hash: row.get(1)?,
                    created_at: row.get(2)?,
                    score: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(users)
    }

    fn insert_user(&self, user: &User) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT INTO users (username, password, userCreatedTimestamp, score) VALUES (?1, ?2, ?3, ?4)",
            params![user.username, user.password_hash, user.created_at, user.score],
        )?;
        Ok(())
    }

    fn update_user(&self, user: &User) -> Result<(), StorageError> {
        self.conn.execute(
            "UPDATE users SET password = ?1, score = ?2 WHERE username = ?3",
            params![user.password_hash, user.score, user.username],
        )?;
        Ok(())
    }

    fn load_words(&self) -> Result<Vec<WordEntry>, StorageError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM words ORDER BY rowid",
            WORD_COLUMNS.join(", ")
        ))?;

        let words = stmt
            .query_map([], |row| {
                let mut variants = Vec::with_capacity(WORD_COLUMNS.len());
                for index in 0..WORD_COLUMNS.len() {
                    let variant: Option<String> = row.get(index)?;
                    variants.push(variant.unwrap_or_default());
                }
                Ok(WordEntry::new(variants))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(words)
    }
}

fn create_tables(conn: &Connection) -> Result<(), StorageError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            username             TEXT PRIMARY KEY NOT NULL,
            password             TEXT NOT NULL,
            userCreatedTimestamp INTEGER NOT NULL,
            score                INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS words (
            wordGer TEXT,
            wordEng TEXT,
            wordUkr TEXT,
            wordMon TEXT,
            wordSpa TEXT,
            wordPor TEXT,
            wordKen TEXT,
            wordNig TEXT,
            wordFre TEXT
        );
        ",
    )?;
    Ok(())
}
