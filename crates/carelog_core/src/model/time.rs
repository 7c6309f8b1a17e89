//! Timestamp formats and clock abstraction.
//!
//! # Responsibility
//! - Format/parse the canonical storage timestamp (ISO local date-time).
//! - Format display titles and export file name stamps.
//! - Provide an injectable clock for deterministic callers.

use chrono::{Local, NaiveDateTime};

const STORAGE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";
const STORAGE_FORMAT_NO_SECONDS: &str = "%Y-%m-%dT%H:%M";
const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M";
const FILE_STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Formats a timestamp for persisted JSON (`2024-01-03T08:30:00.125`).
///
/// Fractional seconds use 3, 6 or 9 digits and are omitted when zero.
pub fn format_storage(value: &NaiveDateTime) -> String {
    value.format(STORAGE_FORMAT).to_string()
}

/// Parses a persisted timestamp, returning `None` when the text is malformed.
pub fn parse_storage(text: &str) -> Option<NaiveDateTime> {
    let trimmed = text.trim();
    NaiveDateTime::parse_from_str(trimmed, STORAGE_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(trimmed, STORAGE_FORMAT_NO_SECONDS))
        .ok()
}

/// Formats the default entry title (`2024-01-03 08:30`).
pub fn format_display(value: &NaiveDateTime) -> String {
    value.format(DISPLAY_FORMAT).to_string()
}

/// Formats the stamp embedded in export file names (`20240103_083000`).
pub fn format_file_stamp(value: &NaiveDateTime) -> String {
    value.format(FILE_STAMP_FORMAT).to_string()
}

/// Source of "now" in local wall-clock time.
pub trait Clock: Send {
    fn now(&self) -> NaiveDateTime;
}

/// Clock backed by the device local time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

#[cfg(test)]
mod tests {
    use super::{format_display, format_file_stamp, format_storage, parse_storage};
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32, milli: u32) -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 3)
            .unwrap()
            .and_hms_milli_opt(h, m, s, milli)
            .unwrap()
    }

    #[test]
    fn storage_format_omits_zero_fraction() {
        assert_eq!(format_storage(&at(8, 30, 0, 0)), "2024-01-03T08:30:00");
        assert_eq!(format_storage(&at(8, 30, 5, 125)), "2024-01-03T08:30:05.125");
    }

    #[test]
    fn parse_storage_accepts_fraction_and_missing_seconds() {
        assert_eq!(
            parse_storage("2024-01-03T08:30:05.125"),
            Some(at(8, 30, 5, 125))
        );
        assert_eq!(parse_storage("2024-01-03T08:30"), Some(at(8, 30, 0, 0)));
        assert_eq!(parse_storage("2024-01-03 08:30"), None);
        assert_eq!(parse_storage(""), None);
    }

    #[test]
    fn display_and_file_stamp_formats() {
        let value = at(8, 30, 5, 0);
        assert_eq!(format_display(&value), "2024-01-03 08:30");
        assert_eq!(format_file_stamp(&value), "20240103_083005");
    }
}
