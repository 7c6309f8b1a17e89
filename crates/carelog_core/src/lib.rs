//! Core logic for the postpartum care log.
//! This crate owns the record model, its persisted blob format, card colors
//! and spreadsheet export.

pub mod codec;
pub mod config;
pub mod db;
pub mod export;
pub mod logging;
pub mod model;
pub mod palette;
pub mod repo;
pub mod service;

pub use config::StorageConfig;
pub use export::job::{ExportCoordinator, ExportHandle, ExportOutcome, ExportStartError};
pub use export::{export_clients_to_spreadsheet, ExportError, ExportResult, ExportTarget};
pub use logging::{init_logging, logging_status, LogLevel, LoggingError};
pub use model::care::{CareEntry, CareInfo, Client, ClientId, EntryId};
pub use model::time::{Clock, SystemClock};
pub use repo::home_repo::{HomeRepository, HomeSnapshot};
pub use repo::prefs_repo::{PreferenceStore, SqlitePreferenceStore};
pub use repo::{RepoError, RepoResult};
pub use service::home_service::{HomeError, HomeResult, HomeService, HomeView};
pub use service::share::{ShareError, ShareRequest, ShareTargetProbe};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
