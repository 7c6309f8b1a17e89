//! Storage locations for the preferences database and export files.
//!
//! # Responsibility
//! - Resolve where the key-value database lives.
//! - Resolve the external/internal export directories.
//!
//! # Invariants
//! - Blank environment values count as unset.
//! - Without overrides everything lands under the process temp dir.

use crate::export::ExportTarget;
use std::path::{Path, PathBuf};

/// Env var overriding the database file path.
pub const ENV_DB_PATH: &str = "CARELOG_DB_PATH";
/// Env var naming the app-private external storage directory.
pub const ENV_EXTERNAL_DIR: &str = "CARELOG_EXTERNAL_DIR";
/// Env var naming the internal app files directory.
pub const ENV_FILES_DIR: &str = "CARELOG_FILES_DIR";

const DB_FILE_NAME: &str = "carelog_prefs.sqlite3";
const DEFAULT_FILES_DIR_NAME: &str = "carelog";

/// Resolved storage locations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    pub db_path: PathBuf,
    pub external_dir: Option<PathBuf>,
    pub files_dir: PathBuf,
}

impl StorageConfig {
    /// Places the database and exports under `files_dir`.
    pub fn under(files_dir: impl Into<PathBuf>, external_dir: Option<PathBuf>) -> Self {
        let files_dir = files_dir.into();
        Self {
            db_path: files_dir.join(DB_FILE_NAME),
            external_dir,
            files_dir,
        }
    }

    /// Reads overrides from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads overrides through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_blank = |key: &str| {
            lookup(key)
                .map(|raw| raw.trim().to_string())
                .filter(|raw| !raw.is_empty())
                .map(PathBuf::from)
        };

        let files_dir = non_blank(ENV_FILES_DIR)
            .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_FILES_DIR_NAME));
        let mut config = Self::under(files_dir, non_blank(ENV_EXTERNAL_DIR));
        if let Some(db_path) = non_blank(ENV_DB_PATH) {
            config.db_path = db_path;
        }
        config
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Export directories, external first.
    pub fn export_target(&self) -> ExportTarget {
        ExportTarget::new(self.external_dir.clone(), self.files_dir.clone())
    }
}
