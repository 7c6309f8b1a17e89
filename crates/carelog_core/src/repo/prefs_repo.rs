//! Preference store contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide typed get/put access to fixed-name preference keys.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - Each put is an independent upsert; there is no multi-key transaction.
//! - A text put never clears the integer slot of the same key and vice versa.

use super::RepoResult;
use rusqlite::{params, Connection, OptionalExtension};

/// Simple durable key-value store.
pub trait PreferenceStore {
    fn get_string(&self, key: &str) -> RepoResult<Option<String>>;
    fn put_string(&self, key: &str, value: &str) -> RepoResult<()>;
    fn get_int(&self, key: &str) -> RepoResult<Option<i64>>;
    fn put_int(&self, key: &str, value: i64) -> RepoResult<()>;
}

/// SQLite-backed preference store over the `preferences` table.
pub struct SqlitePreferenceStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePreferenceStore<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl PreferenceStore for SqlitePreferenceStore<'_> {
    fn get_string(&self, key: &str) -> RepoResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT text_value FROM preferences WHERE key = ?1;",
                [key],
                |row| row.get::<_, Option<String>>(0),
            )
            .optional()?;
        Ok(value.flatten())
    }

    fn put_string(&self, key: &str, value: &str) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO preferences (key, text_value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET
                text_value = excluded.text_value,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![key, value],
        )?;
        Ok(())
    }

    fn get_int(&self, key: &str) -> RepoResult<Option<i64>> {
        let value = self
            .conn
            .query_row(
                "SELECT int_value FROM preferences WHERE key = ?1;",
                [key],
                |row| row.get::<_, Option<i64>>(0),
            )
            .optional()?;
        Ok(value.flatten())
    }

    fn put_int(&self, key: &str, value: i64) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO preferences (key, int_value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET
                int_value = excluded.int_value,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![key, value],
        )?;
        Ok(())
    }
}
