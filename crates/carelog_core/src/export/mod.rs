//! Spreadsheet export of selected clients.
//!
//! # Responsibility
//! - Lay out client blocks and write them as one `.xlsx` worksheet.
//! - Resolve the export directory and timestamped file name.
//! - Run exports on a background worker with a single-flight guard.
//!
//! # Invariants
//! - Exporting an empty selection fails before any file is touched.
//! - The workbook is written to a `.partial` sibling and renamed into place,
//!   so a failed export never leaves a file at the final path.
//! - Sharing and user notification stay outside this module.

pub mod job;
pub mod layout;
pub mod xlsx;

use self::layout::{header_labels, layout_rows, SheetRow, COLUMN_COUNT, NO_RECORDS_TEXT};
use self::xlsx::{CellStyle, Worksheet};
use crate::model::care::Client;
use crate::model::time::format_file_stamp;
use chrono::NaiveDateTime;
use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Name of the single worksheet.
pub const SHEET_NAME: &str = "护理记录";
/// Prefix of every export file name.
pub const EXPORT_FILE_PREFIX: &str = "care_export_";
/// Extension of export files.
pub const EXPORT_FILE_EXTENSION: &str = "xlsx";
/// MIME type of export files.
pub const EXPORT_MIME_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

const PARTIAL_SUFFIX: &str = ".partial";

pub type ExportResult<T> = Result<T, ExportError>;

/// Export failure.
#[derive(Debug)]
pub enum ExportError {
    /// No client was selected.
    EmptySelection,
    /// File-system failure at `path`.
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Workbook packaging failure.
    Package(zip::result::ZipError),
}

impl Display for ExportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptySelection => write!(f, "no clients selected for export"),
            Self::Io { path, source } => write!(f, "{}: {source}", path.display()),
            Self::Package(err) => write!(f, "failed to write workbook: {err}"),
        }
    }
}

impl Error for ExportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::EmptySelection => None,
            Self::Io { source, .. } => Some(source),
            Self::Package(err) => Some(err),
        }
    }
}

impl From<zip::result::ZipError> for ExportError {
    fn from(value: zip::result::ZipError) -> Self {
        Self::Package(value)
    }
}

/// Candidate directories for export files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportTarget {
    /// App-private external storage; unavailable on some devices.
    pub external_dir: Option<PathBuf>,
    /// Internal app storage used when external storage is unavailable.
    pub internal_dir: PathBuf,
}

impl ExportTarget {
    pub fn new(external_dir: Option<PathBuf>, internal_dir: impl Into<PathBuf>) -> Self {
        Self {
            external_dir,
            internal_dir: internal_dir.into(),
        }
    }

    /// Directory that receives the export file.
    pub fn directory(&self) -> &Path {
        self.external_dir
            .as_deref()
            .unwrap_or(self.internal_dir.as_path())
    }
}

/// File name for an export started at `now`.
pub fn export_file_name(now: &NaiveDateTime) -> String {
    format!(
        "{EXPORT_FILE_PREFIX}{}.{EXPORT_FILE_EXTENSION}",
        format_file_stamp(now)
    )
}

/// Builds the worksheet for `clients` in caller order.
pub fn build_worksheet(clients: &[Client]) -> Worksheet {
    let mut sheet = Worksheet::new(SHEET_NAME);
    let last_column = (COLUMN_COUNT - 1) as u32;

    for (index, row) in layout_rows(clients).into_iter().enumerate() {
        let row_index = index as u32;
        match row {
            SheetRow::Title(title) => {
                sheet.set_cell(row_index, 0, title, CellStyle::Title);
                sheet.merge_row(row_index, 0, last_column);
            }
            SheetRow::Header => {
                for (column, label) in header_labels().iter().enumerate() {
                    sheet.set_cell(row_index, column as u32, *label, CellStyle::Header);
                }
            }
            SheetRow::NoRecords => {
                sheet.set_cell(row_index, 0, NO_RECORDS_TEXT, CellStyle::Plain);
            }
            SheetRow::Entry(cells) => {
                for (column, text) in cells.into_iter().enumerate() {
                    sheet.set_cell(row_index, column as u32, text, CellStyle::Plain);
                }
            }
            SheetRow::Blank => {}
        }
    }

    sheet.auto_size_columns(COLUMN_COUNT as u32);
    sheet
}

/// Exports `clients` to `care_export_<yyyyMMdd_HHmmss>.xlsx` under the
/// target directory and returns the written path.
///
/// # Errors
/// - `EmptySelection` when `clients` is empty; no file is created.
/// - `Io` / `Package` when the directory or file cannot be written.
pub fn export_clients_to_spreadsheet(
    clients: &[Client],
    target: &ExportTarget,
    now: NaiveDateTime,
) -> ExportResult<PathBuf> {
    if clients.is_empty() {
        return Err(ExportError::EmptySelection);
    }

    let started_at = Instant::now();
    let directory = target.directory();
    std::fs::create_dir_all(directory).map_err(|source| ExportError::Io {
        path: directory.to_path_buf(),
        source,
    })?;

    let sheet = build_worksheet(clients);
    let final_path = directory.join(export_file_name(&now));
    let partial_path = directory.join(format!("{}{PARTIAL_SUFFIX}", export_file_name(&now)));

    let result = write_workbook_file(&sheet, &partial_path).and_then(|()| {
        std::fs::rename(&partial_path, &final_path).map_err(|source| ExportError::Io {
            path: final_path.clone(),
            source,
        })
    });

    match result {
        Ok(()) => {
            info!(
                "event=export_write module=export status=ok clients={} duration_ms={}",
                clients.len(),
                started_at.elapsed().as_millis()
            );
            Ok(final_path)
        }
        Err(err) => {
            let _ = std::fs::remove_file(&partial_path);
            error!(
                "event=export_write module=export status=error clients={} duration_ms={} error={}",
                clients.len(),
                started_at.elapsed().as_millis(),
                err
            );
            Err(err)
        }
    }
}

fn write_workbook_file(sheet: &Worksheet, path: &Path) -> ExportResult<()> {
    let io_error = |source: std::io::Error| ExportError::Io {
        path: path.to_path_buf(),
        source,
    };

    let file = File::create(path).map_err(io_error)?;
    let writer = sheet.write_workbook(BufWriter::new(file))?;
    let file = writer.into_inner().map_err(|err| io_error(err.into_error()))?;
    file.sync_all().map_err(io_error)?;
    Ok(())
}
