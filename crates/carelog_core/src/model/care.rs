//! Client, care entry and care info records.
//!
//! # Responsibility
//! - Define the persisted record shapes and their wire field names.
//! - Provide id allocation and ordering helpers used by services and codec.
//!
//! # Invariants
//! - `CareInfo` fields are free text and default to `""`.
//! - `Client::entries` is sorted by `created_at` descending after every
//!   mutation that goes through `Client::sort_entries`.
//! - A packed `color` of `0` means "not yet assigned".

use crate::model::time::{format_display, format_storage};
use chrono::NaiveDateTime;
use serde::{Serialize, Serializer};

/// Client identifier, unique across the whole collection.
pub type ClientId = i64;
/// Entry identifier, unique within one client.
pub type EntryId = i64;

/// Labels of the eleven care fields, in canonical column order.
pub const CARE_FIELD_LABELS: [&str; 11] = [
    "喂奶时间",
    "喂奶次数",
    "奶量",
    "喂水次数",
    "水量",
    "宝宝大小便次数",
    "有无异常",
    "宝妈排尿次数",
    "排尿量",
    "擦身次数",
    "其他情况",
];

/// One caregiving observation: baby care followed by mother care.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CareInfo {
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

impl CareInfo {
    /// Field values in the same order as `CARE_FIELD_LABELS`.
    pub fn values(&self) -> [&str; 11] {
        [
            self.baby_feeding_time.as_str(),
            self.baby_feeding_count.as_str(),
            self.baby_milk_amount.as_str(),
            self.baby_water_count.as_str(),
            self.baby_water_amount.as_str(),
            self.baby_excretion_count.as_str(),
            self.baby_abnormal.as_str(),
            self.mom_urination_count.as_str(),
            self.mom_urination_amount.as_str(),
            self.mom_wipe_count.as_str(),
            self.mom_other.as_str(),
        ]
    }

    /// Returns whether every field is empty.
    pub fn is_empty(&self) -> bool {
        self.values().iter().all(|value| value.is_empty())
    }
}

/// One dated caregiving log owned by a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CareEntry {
    pub id: EntryId,
    pub title: String,
    #[serde(serialize_with = "serialize_timestamp")]
    pub created_at: NaiveDateTime,
    pub care_info: CareInfo,
}

impl CareEntry {
    /// Creates an empty entry titled with its formatted creation time.
    pub fn new(id: EntryId, created_at: NaiveDateTime) -> Self {
        Self {
            id,
            title: format_display(&created_at),
            created_at,
            care_info: CareInfo::default(),
        }
    }
}

/// Top-level named record grouping a series of care entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: ClientId,
    pub title: String,
    #[serde(serialize_with = "serialize_timestamp")]
    pub created_at: NaiveDateTime,
    /// Packed display color; `0` until assigned.
    pub color: i64,
    pub entries: Vec<CareEntry>,
}

impl Client {
    /// Creates a client without entries.
    pub fn new(id: ClientId, title: impl Into<String>, created_at: NaiveDateTime) -> Self {
        Self {
            id,
            title: title.into(),
            created_at,
            color: 0,
            entries: Vec::new(),
        }
    }

    /// Next entry id for this client: max existing id + 1, or 0.
    ///
    /// `None` when the largest id is already `EntryId::MAX`.
    pub fn next_entry_id(&self) -> Option<EntryId> {
        match self.entries.iter().map(|entry| entry.id).max() {
            Some(max) => max.checked_add(1),
            None => Some(0),
        }
    }

    /// Sorts entries newest first; ties keep their current order.
    pub fn sort_entries(&mut self) {
        sort_entries_descending(&mut self.entries);
    }

    pub fn entry(&self, entry_id: EntryId) -> Option<&CareEntry> {
        self.entries.iter().find(|entry| entry.id == entry_id)
    }

    pub fn entry_mut(&mut self, entry_id: EntryId) -> Option<&mut CareEntry> {
        self.entries.iter_mut().find(|entry| entry.id == entry_id)
    }

    pub fn has_color(&self) -> bool {
        self.color != 0
    }
}

/// Smallest valid next-client id for a collection: max id + 1, or 0.
///
/// `None` when the largest id is already `ClientId::MAX`.
pub fn min_next_client_id(clients: &[Client]) -> Option<ClientId> {
    match clients.iter().map(|client| client.id).max() {
        Some(max) => max.checked_add(1),
        None => Some(0),
    }
}

/// Sorts clients newest first; ties keep their current order.
pub fn sort_clients_descending(clients: &mut [Client]) {
    clients.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

/// Sorts entries newest first; ties keep their current order.
pub fn sort_entries_descending(entries: &mut [CareEntry]) {
    entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

fn serialize_timestamp<S>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format_storage(value))
}

#[cfg(test)]
mod tests {
    use super::{min_next_client_id, CareEntry, CareInfo, Client, CARE_FIELD_LABELS};
    use chrono::NaiveDate;

    fn day(d: u32) -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, d)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    #[test]
    fn next_entry_id_starts_at_zero_and_follows_max() {
        let mut client = Client::new(3, "Ms. Li", day(1));
        assert_eq!(client.next_entry_id(), Some(0));

        client.entries.push(CareEntry::new(4, day(2)));
        client.entries.push(CareEntry::new(1, day(3)));
        assert_eq!(client.next_entry_id(), Some(5));

        client.entries.push(CareEntry::new(i64::MAX, day(4)));
        assert_eq!(client.next_entry_id(), None);
    }

    #[test]
    fn min_next_client_id_handles_empty_collection() {
        assert_eq!(min_next_client_id(&[]), Some(0));
        let mut clients = vec![Client::new(7, "a", day(1)), Client::new(2, "b", day(2))];
        assert_eq!(min_next_client_id(&clients), Some(8));

        clients.push(Client::new(i64::MAX, "c", day(3)));
        assert_eq!(min_next_client_id(&clients), None);
    }

    #[test]
    fn sort_entries_is_newest_first() {
        let mut client = Client::new(0, "a", day(1));
        client.entries = vec![
            CareEntry::new(0, day(3)),
            CareEntry::new(1, day(1)),
            CareEntry::new(2, day(2)),
        ];
        client.sort_entries();
        let ids: Vec<_> = client.entries.iter().map(|entry| entry.id).collect();
        assert_eq!(ids, vec![0, 2, 1]);
    }

    #[test]
    fn care_info_values_match_label_count() {
        let info = CareInfo {
            mom_other: "note".to_string(),
            ..CareInfo::default()
        };
        assert_eq!(info.values().len(), CARE_FIELD_LABELS.len());
        assert_eq!(info.values()[10], "note");
        assert!(!info.is_empty());
        assert!(CareInfo::default().is_empty());
    }
}
