//! Repository layer over the on-device key-value store.
//!
//! # Responsibility
//! - Define the preference store contract and its SQLite implementation.
//! - Persist and load the whole client collection through the JSON codec.
//!
//! # Invariants
//! - Saves always write the entire collection, never a delta.
//! - Blob parse failures degrade to an empty collection; only storage
//!   failures surface as `RepoError`.

pub mod home_repo;
pub mod prefs_repo;

use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for preference reads/writes and blob encoding.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    Encode(serde_json::Error),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Encode(err) => write!(f, "failed to encode client collection: {err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Encode(err) => Some(err),
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<serde_json::Error> for RepoError {
    fn from(value: serde_json::Error) -> Self {
        Self::Encode(value)
    }
}
