//! Tolerant decoder for every historical `home_items` blob shape.
//!
//! Each client object is classified into one `StoredClientShape` and decoded
//! by the matching pure function. Field-level problems fall back to defaults;
//! a blob that is not a JSON array decodes to an empty collection.

use crate::model::care::{
    sort_clients_descending, sort_entries_descending, CareEntry, CareInfo, Client,
};
use crate::model::time::{format_display, parse_storage, Clock, SystemClock};
use chrono::NaiveDateTime;
use log::{debug, warn};
use serde_json::{Map, Value};

type JsonObject = Map<String, Value>;

/// Persisted client layout, resolved in priority order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StoredClientShape<'a> {
    /// `entries` array present.
    Current(&'a [Value]),
    /// No `entries` array; single top-level `careInfo` object.
    Legacy(&'a JsonObject),
    /// Neither field present.
    Bare,
}

impl<'a> StoredClientShape<'a> {
    pub fn classify(object: &'a JsonObject) -> Self {
        if let Some(entries) = object.get("entries").and_then(Value::as_array) {
            return Self::Current(entries.as_slice());
        }
        if let Some(care_info) = object.get("careInfo").and_then(Value::as_object) {
            return Self::Legacy(care_info);
        }
        Self::Bare
    }
}

/// Decodes a `home_items` blob using the system clock for timestamp fallback.
pub fn decode_clients(blob: Option<&str>) -> Vec<Client> {
    decode_clients_at(blob, SystemClock.now())
}

/// Decodes a `home_items` blob; unparseable timestamps become `now`.
pub fn decode_clients_at(blob: Option<&str>, now: NaiveDateTime) -> Vec<Client> {
    let Some(text) = blob.filter(|text| !text.trim().is_empty()) else {
        return Vec::new();
    };

    let items = match serde_json::from_str::<Value>(text) {
        Ok(Value::Array(items)) => items,
        Ok(_) => {
            warn!("event=home_decode module=codec status=error error_code=blob_not_array");
            return Vec::new();
        }
        Err(err) => {
            warn!(
                "event=home_decode module=codec status=error error_code=blob_malformed line={} column={}",
                err.line(),
                err.column()
            );
            return Vec::new();
        }
    };

    let mut clients = items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| {
            item.as_object()
                .map(|object| decode_client(object, index, now))
        })
        .collect::<Vec<_>>();
    sort_clients_descending(&mut clients);

    debug!(
        "event=home_decode module=codec status=ok clients={} skipped={}",
        clients.len(),
        items.len() - clients.len()
    );
    clients
}

fn decode_client(object: &JsonObject, index: usize, now: NaiveDateTime) -> Client {
    let created_at = timestamp_or(object, "createdAt", now);
    let entries = match StoredClientShape::classify(object) {
        StoredClientShape::Current(items) => decode_current_entries(items, now),
        StoredClientShape::Legacy(care_info) => decode_legacy_entry(care_info, created_at),
        StoredClientShape::Bare => Vec::new(),
    };

    Client {
        id: int_or(object, "id", index as i64),
        title: text_or_empty(object, "title"),
        created_at,
        color: int_or(object, "color", 0),
        entries,
    }
}

fn decode_current_entries(items: &[Value], now: NaiveDateTime) -> Vec<CareEntry> {
    let mut entries = items
        .iter()
        .filter_map(Value::as_object)
        .map(|object| decode_entry(object, now))
        .collect::<Vec<_>>();
    sort_entries_descending(&mut entries);
    entries
}

fn decode_legacy_entry(care_info: &JsonObject, client_created_at: NaiveDateTime) -> Vec<CareEntry> {
    vec![CareEntry {
        id: 0,
        title: format_display(&client_created_at),
        created_at: client_created_at,
        care_info: decode_care_info(care_info),
    }]
}

fn decode_entry(object: &JsonObject, now: NaiveDateTime) -> CareEntry {
    let created_at = timestamp_or(object, "createdAt", now);
    let title = text_or_empty(object, "title");
    let care_info = object
        .get("careInfo")
        .and_then(Value::as_object)
        .map(decode_care_info)
        .unwrap_or_default();

    CareEntry {
        id: int_or(object, "id", 0),
        title: if title.trim().is_empty() {
            format_display(&created_at)
        } else {
            title
        },
        created_at,
        care_info,
    }
}

fn decode_care_info(object: &JsonObject) -> CareInfo {
    CareInfo {
        baby_feeding_time: text_or_empty(object, "babyFeedingTime"),
        baby_feeding_count: text_or_empty(object, "babyFeedingCount"),
        baby_milk_amount: text_or_empty(object, "babyMilkAmount"),
        baby_water_count: text_or_empty(object, "babyWaterCount"),
        baby_water_amount: text_or_empty(object, "babyWaterAmount"),
        baby_excretion_count: text_or_empty(object, "babyExcretionCount"),
        baby_abnormal: text_or_empty(object, "babyAbnormal"),
        mom_urination_count: text_or_empty(object, "momUrinationCount"),
        mom_urination_amount: text_or_empty(object, "momUrinationAmount"),
        mom_wipe_count: text_or_empty(object, "momWipeCount"),
        mom_other: text_or_empty(object, "momOther"),
    }
}

fn timestamp_or(object: &JsonObject, key: &str, fallback: NaiveDateTime) -> NaiveDateTime {
    object
        .get(key)
        .and_then(Value::as_str)
        .and_then(parse_storage)
        .unwrap_or(fallback)
}

/// Reads an integer, accepting numeric strings and truncating fractions.
///
/// Values outside the `i64` range fall back instead of saturating.
fn int_or(object: &JsonObject, key: &str, fallback: i64) -> i64 {
    match object.get(key) {
        Some(Value::Number(number)) => number
            .as_i64()
            .or_else(|| number.as_f64().and_then(truncate_in_range))
            .unwrap_or(fallback),
        Some(Value::String(text)) => {
            let trimmed = text.trim();
            trimmed
                .parse::<i64>()
                .ok()
                .or_else(|| trimmed.parse::<f64>().ok().and_then(truncate_in_range))
                .unwrap_or(fallback)
        }
        _ => fallback,
    }
}

fn truncate_in_range(value: f64) -> Option<i64> {
    // 2^63 is exact in f64; `i64::MAX as f64` rounds up to it.
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    let truncated = value.trunc();
    (truncated >= -LIMIT && truncated < LIMIT).then_some(truncated as i64)
}

/// Reads free text; non-string scalars are rendered, `null` becomes `""`.
fn text_or_empty(object: &JsonObject, key: &str) -> String {
    match object.get(key) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}
