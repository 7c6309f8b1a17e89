//! Row layout of the care export sheet.
//!
//! Pure transformation from clients to sheet rows; no I/O.

use crate::model::care::{CareEntry, Client, CARE_FIELD_LABELS};

/// Label of the first column (entry title).
pub const RECORD_COLUMN_LABEL: &str = "记录";
/// Placeholder written when a client has no entries.
pub const NO_RECORDS_TEXT: &str = "暂无记录";
/// Number of columns in every client block.
pub const COLUMN_COUNT: usize = CARE_FIELD_LABELS.len() + 1;

/// One logical row of the export sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetRow {
    /// Client title, merged across all columns.
    Title(String),
    /// Fixed column labels.
    Header,
    /// Single-cell placeholder for a client without entries.
    NoRecords,
    /// Entry title followed by the eleven care fields.
    Entry(Vec<String>),
    /// Separator between client blocks.
    Blank,
}

/// Header labels in column order.
pub fn header_labels() -> [&'static str; COLUMN_COUNT] {
    let mut labels = [RECORD_COLUMN_LABEL; COLUMN_COUNT];
    labels[1..].copy_from_slice(&CARE_FIELD_LABELS);
    labels
}

/// Lays out client blocks in caller order.
///
/// Entries are written oldest first, the reverse of the stored order, so the
/// sheet reads chronologically.
pub fn layout_rows(clients: &[Client]) -> Vec<SheetRow> {
    let mut rows = Vec::new();
    for (index, client) in clients.iter().enumerate() {
        if index > 0 {
            rows.push(SheetRow::Blank);
        }
        rows.push(SheetRow::Title(client.title.clone()));
        rows.push(SheetRow::Header);

        if client.entries.is_empty() {
            rows.push(SheetRow::NoRecords);
            continue;
        }

        let mut entries = client.entries.iter().collect::<Vec<_>>();
        entries.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        rows.extend(entries.into_iter().map(entry_row));
    }
    rows
}

fn entry_row(entry: &CareEntry) -> SheetRow {
    let mut cells = Vec::with_capacity(COLUMN_COUNT);
    cells.push(entry.title.clone());
    cells.extend(
        entry
            .care_info
            .values()
            .iter()
            .map(|value| (*value).to_string()),
    );
    SheetRow::Entry(cells)
}

#[cfg(test)]
mod tests {
    use super::{header_labels, layout_rows, SheetRow, COLUMN_COUNT};
    use crate::model::care::{CareEntry, Client};
    use chrono::NaiveDate;

    fn day(d: u32) -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, d)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
    }

    #[test]
    fn header_starts_with_record_column() {
        let labels = header_labels();
        assert_eq!(labels.len(), 12);
        assert_eq!(labels[0], "记录");
        assert_eq!(labels[1], "喂奶时间");
        assert_eq!(labels[11], "其他情况");
    }

    #[test]
    fn empty_client_gets_placeholder_and_blocks_are_separated() {
        let first = Client::new(0, "A", day(1));
        let mut second = Client::new(1, "B", day(2));
        second.entries.push(CareEntry::new(0, day(2)));

        let rows = layout_rows(&[first, second]);
        assert_eq!(rows[0], SheetRow::Title("A".to_string()));
        assert_eq!(rows[1], SheetRow::Header);
        assert_eq!(rows[2], SheetRow::NoRecords);
        assert_eq!(rows[3], SheetRow::Blank);
        assert_eq!(rows[4], SheetRow::Title("B".to_string()));
        assert_eq!(rows.len(), 7);
        match &rows[6] {
            SheetRow::Entry(cells) => {
                assert_eq!(cells.len(), COLUMN_COUNT);
                assert_eq!(cells[0], "2024-01-02 10:00");
            }
            other => panic!("unexpected row: {other:?}"),
        }
    }
}
