//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose client/entry CRUD, export and share preparation to Dart via FRB.
//! - Translate core errors into flat response envelopes.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - Home mutations are serialized by one process-wide lock; each call
//!   loads, mutates and re-persists the full collection.
//! - Export runs as a non-sync FRB call so the UI thread never blocks on it.

use carelog_core::db::open_db;
use carelog_core::export::EXPORT_MIME_TYPE;
use carelog_core::model::time::format_storage;
use carelog_core::service::share::prepare_share;
use carelog_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    CareEntry, CareInfo, Client, ExportCoordinator, ExportOutcome, HomeResult, HomeService,
    LogLevel, ShareError, ShareTargetProbe, SqlitePreferenceStore, StorageConfig,
};
use log::warn;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock, PoisonError};

static STORAGE: OnceLock<StorageConfig> = OnceLock::new();
static EXPORTS: OnceLock<ExportCoordinator> = OnceLock::new();
static HOME_LOCK: Mutex<()> = Mutex::new(());
static LAST_EXPORT: Mutex<Option<PathBuf>> = Mutex::new(None);

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Log level the app should pass to `init_logging` for this build.
#[flutter_rust_bridge::frb(sync)]
pub fn default_log_level() -> String {
    LogLevel::build_default().as_str().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Sync call; may perform small file-system setup work.
/// - Idempotent for the same `level + log_dir`; conflicting calls fail.
/// - Returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Sets the database path and export directories for this process.
///
/// Must run before the first home call; otherwise the environment/temp-dir
/// defaults are already locked in. Repeating the active configuration is
/// accepted. Returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn configure_storage(
    db_path: String,
    files_dir: String,
    external_dir: Option<String>,
) -> String {
    let db_path = db_path.trim();
    let files_dir = files_dir.trim();
    if db_path.is_empty() || files_dir.is_empty() {
        return "db_path and files_dir must not be empty".to_string();
    }

    let external_dir = external_dir
        .map(|dir| dir.trim().to_string())
        .filter(|dir| !dir.is_empty())
        .map(PathBuf::from);
    let mut requested = StorageConfig::under(files_dir, external_dir);
    requested.db_path = PathBuf::from(db_path);

    let active = STORAGE.get_or_init(|| requested.clone());
    if *active == requested {
        String::new()
    } else {
        format!(
            "storage already configured with db `{}`; refusing to switch",
            active.db_path.display()
        )
    }
}

/// The eleven care fields as plain strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CareInfoItem {
    pub baby_feeding_time: String,
    pub baby_feeding_count: String,
    pub baby_milk_amount: String,
    pub baby_water_count: String,
    pub baby_water_amount: String,
    pub baby_excretion_count: String,
    pub baby_abnormal: String,
    pub mom_urination_count: String,
    pub mom_urination_amount: String,
    pub mom_wipe_count: String,
    pub mom_other: String,
}

impl From<CareInfo> for CareInfoItem {
    fn from(value: CareInfo) -> Self {
        Self {
            baby_feeding_time: value.baby_feeding_time,
            baby_feeding_count: value.baby_feeding_count,
            baby_milk_amount: value.baby_milk_amount,
            baby_water_count: value.baby_water_count,
            baby_water_amount: value.baby_water_amount,
            baby_excretion_count: value.baby_excretion_count,
            baby_abnormal: value.baby_abnormal,
            mom_urination_count: value.mom_urination_count,
            mom_urination_amount: value.mom_urination_amount,
            mom_wipe_count: value.mom_wipe_count,
            mom_other: value.mom_other,
        }
    }
}

impl From<CareInfoItem> for CareInfo {
    fn from(value: CareInfoItem) -> Self {
        Self {
            baby_feeding_time: value.baby_feeding_time,
            baby_feeding_count: value.baby_feeding_count,
            baby_milk_amount: value.baby_milk_amount,
            baby_water_count: value.baby_water_count,
            baby_water_amount: value.baby_water_amount,
            baby_excretion_count: value.baby_excretion_count,
            baby_abnormal: value.baby_abnormal,
            mom_urination_count: value.mom_urination_count,
            mom_urination_amount: value.mom_urination_amount,
            mom_wipe_count: value.mom_wipe_count,
            mom_other: value.mom_other,
        }
    }
}

/// One care entry as shown in a client's entry list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryItem {
    pub id: i64,
    pub title: String,
    /// Local ISO timestamp (`2024-01-03T08:30:00`).
    pub created_at: String,
    pub care_info: CareInfoItem,
}

/// One client card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientItem {
    pub id: i64,
    pub title: String,
    pub created_at: String,
    /// Card color as a 32-bit ARGB word.
    pub color_argb: u32,
    /// Entries newest first.
    pub entries: Vec<EntryItem>,
}

/// Full collection snapshot for the home screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HomeLoadResponse {
    pub ok: bool,
    /// Clients newest first.
    pub clients: Vec<ClientItem>,
    pub message: String,
}

/// Generic action envelope for client/entry mutations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HomeActionResponse {
    pub ok: bool,
    /// Created client or entry id, when the action creates one.
    pub id: Option<i64>,
    pub message: String,
}

impl HomeActionResponse {
    fn success(message: impl Into<String>, id: Option<i64>) -> Self {
        Self {
            ok: true,
            id,
            message: message.into(),
        }
    }

    fn failure(call: &str, message: impl Into<String>) -> Self {
        warn!("event=ffi_call module=ffi status=error call={call}");
        Self {
            ok: false,
            id: None,
            message: message.into(),
        }
    }
}

/// Result of one export run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportResponse {
    pub ok: bool,
    /// Absolute path of the written workbook.
    pub path: Option<String>,
    pub message: String,
}

/// Share dispatch data for the platform layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareResponse {
    pub ok: bool,
    pub path: Option<String>,
    pub mime_type: String,
    pub target_package: String,
    pub message: String,
}

/// Loads every client with its entries.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Stored colors are assigned and persisted on first load.
#[flutter_rust_bridge::frb(sync)]
pub fn home_load() -> HomeLoadResponse {
    match with_home_service(|service| {
        let colors = service.display_colors();
        Ok(service
            .clients()
            .iter()
            .map(|client| to_client_item(client, &colors))
            .collect::<Vec<_>>())
    }) {
        Ok(clients) => HomeLoadResponse {
            message: format!("Loaded {} client(s).", clients.len()),
            ok: true,
            clients,
        },
        Err(err) => {
            warn!("event=ffi_call module=ffi status=error call=home_load");
            HomeLoadResponse {
                ok: false,
                clients: Vec::new(),
                message: format!("home_load failed: {err}"),
            }
        }
    }
}

/// Creates a client; the title is trimmed and must not be blank.
#[flutter_rust_bridge::frb(sync)]
pub fn home_create_client(title: String) -> HomeActionResponse {
    match with_home_service(|service| service.create_client(&title)) {
        Ok(id) => HomeActionResponse::success("Client created.", Some(id)),
        Err(err) => HomeActionResponse::failure(
            "home_create_client",
            format!("home_create_client failed: {err}"),
        ),
    }
}

/// Deletes a client and all of its entries.
#[flutter_rust_bridge::frb(sync)]
pub fn home_delete_client(client_id: i64) -> HomeActionResponse {
    match with_home_service(|service| service.delete_client(client_id)) {
        Ok(()) => HomeActionResponse::success("Client deleted.", None),
        Err(err) => HomeActionResponse::failure(
            "home_delete_client",
            format!("home_delete_client failed: {err}"),
        ),
    }
}

/// Adds an empty entry to a client.
#[flutter_rust_bridge::frb(sync)]
pub fn entry_add(client_id: i64) -> HomeActionResponse {
    match with_home_service(|service| service.add_entry(client_id)) {
        Ok(id) => HomeActionResponse::success("Entry created.", Some(id)),
        Err(err) => HomeActionResponse::failure("entry_add", format!("entry_add failed: {err}")),
    }
}

/// Replaces the care fields of one entry.
#[flutter_rust_bridge::frb(sync)]
pub fn entry_update_care_info(
    client_id: i64,
    entry_id: i64,
    care_info: CareInfoItem,
) -> HomeActionResponse {
    match with_home_service(|service| {
        service.update_entry_care_info(client_id, entry_id, care_info.into())
    }) {
        Ok(()) => HomeActionResponse::success("Entry saved.", None),
        Err(err) => HomeActionResponse::failure(
            "entry_update_care_info",
            format!("entry_update_care_info failed: {err}"),
        ),
    }
}

/// Deletes one entry.
#[flutter_rust_bridge::frb(sync)]
pub fn entry_delete(client_id: i64, entry_id: i64) -> HomeActionResponse {
    match with_home_service(|service| service.delete_entry(client_id, entry_id)) {
        Ok(()) => HomeActionResponse::success("Entry deleted.", None),
        Err(err) => {
            HomeActionResponse::failure("entry_delete", format!("entry_delete failed: {err}"))
        }
    }
}

/// Exports the selected clients to a spreadsheet file.
///
/// # FFI contract
/// - Async call (runs off the UI thread); waits for the export worker.
/// - At most one export runs at a time; a concurrent call fails fast.
/// - Unknown ids are ignored; an empty resulting selection fails.
pub fn export_clients(client_ids: Vec<i64>) -> ExportResponse {
    let clients = match with_home_service(|service| Ok(service.clients_for_export(&client_ids))) {
        Ok(clients) => clients,
        Err(err) => return export_failure(format!("export_clients failed: {err}")),
    };

    let handle = match export_coordinator().start(clients, storage_config().export_target()) {
        Ok(handle) => handle,
        Err(err) => return export_failure(err.to_string()),
    };

    match handle.wait() {
        ExportOutcome::Succeeded { path } => {
            let display = path.to_string_lossy().into_owned();
            *LAST_EXPORT.lock().unwrap_or_else(PoisonError::into_inner) = Some(path);
            ExportResponse {
                ok: true,
                message: format!("Exported to {display}"),
                path: Some(display),
            }
        }
        ExportOutcome::Failed { message } => export_failure(format!("Export failed: {message}")),
    }
}

/// Whether an export is currently running.
#[flutter_rust_bridge::frb(sync)]
pub fn export_in_progress() -> bool {
    export_coordinator().is_running()
}

/// Whether the last export still exists and the share action is usable.
#[flutter_rust_bridge::frb(sync)]
pub fn share_enabled() -> bool {
    LAST_EXPORT
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .as_deref()
        .is_some_and(|path| path.is_file())
}

/// Validates the last export for sharing to the messaging app.
///
/// `target_installed` is the platform's package check for the share target.
#[flutter_rust_bridge::frb(sync)]
pub fn share_prepare(target_installed: bool) -> ShareResponse {
    let mut last_export = LAST_EXPORT.lock().unwrap_or_else(PoisonError::into_inner);
    match prepare_share(last_export.as_deref(), &InstalledFlag(target_installed)) {
        Ok(request) => ShareResponse {
            ok: true,
            path: Some(request.path.to_string_lossy().into_owned()),
            mime_type: request.mime_type.to_string(),
            target_package: request.target_package.to_string(),
            message: String::new(),
        },
        Err(err) => {
            if err == ShareError::NoRecentExport {
                *last_export = None;
            }
            ShareResponse {
                ok: false,
                path: None,
                mime_type: EXPORT_MIME_TYPE.to_string(),
                target_package: String::new(),
                message: err.to_string(),
            }
        }
    }
}

struct InstalledFlag(bool);

impl ShareTargetProbe for InstalledFlag {
    fn is_installed(&self, _package: &str) -> bool {
        self.0
    }
}

fn storage_config() -> &'static StorageConfig {
    STORAGE.get_or_init(StorageConfig::from_env)
}

fn export_coordinator() -> &'static ExportCoordinator {
    EXPORTS.get_or_init(ExportCoordinator::new)
}

fn with_home_service<T>(
    f: impl FnOnce(&mut HomeService<SqlitePreferenceStore<'_>>) -> HomeResult<T>,
) -> Result<T, String> {
    let _guard = HOME_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
    let conn = open_db(storage_config().db_path())
        .map_err(|err| format!("care DB open failed: {err}"))?;
    let mut service = HomeService::open(SqlitePreferenceStore::new(&conn))
        .map_err(|err| format!("home load failed: {err}"))?;
    f(&mut service).map_err(|err| err.to_string())
}

fn export_failure(message: String) -> ExportResponse {
    warn!("event=ffi_call module=ffi status=error call=export_clients");
    ExportResponse {
        ok: false,
        path: None,
        message,
    }
}

fn to_client_item(client: &Client, colors: &HashMap<i64, u32>) -> ClientItem {
    ClientItem {
        id: client.id,
        title: client.title.clone(),
        created_at: format_storage(&client.created_at),
        color_argb: colors.get(&client.id).copied().unwrap_or_default(),
        entries: client.entries.iter().map(to_entry_item).collect(),
    }
}

fn to_entry_item(entry: &CareEntry) -> EntryItem {
    EntryItem {
        id: entry.id,
        title: entry.title.clone(),
        created_at: format_storage(&entry.created_at),
        care_info: entry.care_info.clone().into(),
    }
}

#[cfg(test)]
mod tests {
    use super::{
        configure_storage, core_version, default_log_level, entry_add, entry_delete,
        entry_update_care_info, export_clients, home_create_client, home_delete_client, home_load,
        init_logging, ping, share_enabled, share_prepare, storage_config, CareInfoItem, ClientItem,
    };
    use std::time::{SystemTime, UNIX_EPOCH};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn default_log_level_is_supported() {
        assert!(["debug", "info"].contains(&default_log_level().as_str()));
    }

    #[test]
    fn init_logging_rejects_empty_log_dir() {
        let error = init_logging("info".to_string(), String::new());
        assert!(!error.is_empty());
    }

    #[test]
    fn init_logging_rejects_unsupported_level() {
        let error = init_logging("verbose".to_string(), "tmp/logs".to_string());
        assert!(!error.is_empty());
    }

    #[test]
    fn configure_storage_rejects_blank_paths_and_accepts_active_config() {
        assert!(!configure_storage(" ".to_string(), "/tmp".to_string(), None).is_empty());

        let active = storage_config();
        let repeated = configure_storage(
            active.db_path.to_string_lossy().into_owned(),
            active.files_dir.to_string_lossy().into_owned(),
            active
                .external_dir
                .as_ref()
                .map(|dir| dir.to_string_lossy().into_owned()),
        );
        assert_eq!(repeated, "");
    }

    #[test]
    fn create_load_and_delete_client() {
        let title = unique_token("client");
        let created = home_create_client(format!("  {title}  "));
        assert!(created.ok, "{}", created.message);
        let client_id = created.id.expect("create should return id");

        let loaded = find_client(client_id).expect("created client should load");
        assert_eq!(loaded.title, title);
        assert_ne!(loaded.color_argb, 0);
        assert!(loaded.entries.is_empty());

        assert!(home_delete_client(client_id).ok);
        assert!(find_client(client_id).is_none());
        assert!(!home_delete_client(client_id).ok);
    }

    #[test]
    fn blank_client_title_is_rejected() {
        let response = home_create_client("   ".to_string());
        assert!(!response.ok);
        assert!(response.message.contains("blank"));
    }

    #[test]
    fn entry_add_update_and_delete() {
        let client_id = home_create_client(unique_token("entries"))
            .id
            .expect("create should return id");

        let added = entry_add(client_id);
        assert!(added.ok, "{}", added.message);
        assert_eq!(added.id, Some(0));

        let info = CareInfoItem {
            baby_milk_amount: "90ml".to_string(),
            mom_other: "睡得好".to_string(),
            ..CareInfoItem::default()
        };
        assert!(entry_update_care_info(client_id, 0, info.clone()).ok);

        let loaded = find_client(client_id).expect("client should load");
        assert_eq!(loaded.entries[0].care_info, info);

        assert!(entry_delete(client_id, 0).ok);
        assert!(!entry_delete(client_id, 0).ok);
        assert!(home_delete_client(client_id).ok);
    }

    #[test]
    fn export_then_share_last_file() {
        let client_id = home_create_client(unique_token("export"))
            .id
            .expect("create should return id");

        let empty = export_clients(Vec::new());
        assert!(!empty.ok);

        let exported = export_clients(vec![client_id]);
        assert!(exported.ok, "{}", exported.message);
        let path = exported.path.expect("export should return path");
        assert!(path.ends_with(".xlsx"));
        assert!(share_enabled());

        let not_installed = share_prepare(false);
        assert!(!not_installed.ok);

        let share = share_prepare(true);
        assert!(share.ok, "{}", share.message);
        assert_eq!(share.path.as_deref(), Some(path.as_str()));
        assert_eq!(share.target_package, "com.tencent.mm");

        assert!(home_delete_client(client_id).ok);
    }

    fn find_client(client_id: i64) -> Option<ClientItem> {
        let response = home_load();
        assert!(response.ok, "{}", response.message);
        response
            .clients
            .into_iter()
            .find(|client| client.id == client_id)
    }

    fn unique_token(prefix: &str) -> String {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time went backwards")
            .as_nanos();
        format!("{prefix}-{nanos}")
    }
}
