use carelog_core::model::care::CARE_FIELD_LABELS;
use carelog_core::{CareEntry, CareInfo, Client};
use chrono::NaiveDate;

#[test]
fn new_client_starts_uncolored_and_empty() {
    let created_at = NaiveDate::from_ymd_opt(2024, 5, 6)
        .unwrap()
        .and_hms_opt(7, 8, 9)
        .unwrap();
    let client = Client::new(0, "陈女士", created_at);

    assert_eq!(client.color, 0);
    assert!(!client.has_color());
    assert!(client.entries.is_empty());
    assert_eq!(client.next_entry_id(), Some(0));
}

#[test]
fn new_entry_title_is_minute_precision_timestamp() {
    let created_at = NaiveDate::from_ymd_opt(2024, 5, 6)
        .unwrap()
        .and_hms_milli_opt(7, 8, 9, 500)
        .unwrap();
    let entry = CareEntry::new(3, created_at);

    assert_eq!(entry.title, "2024-05-06 07:08");
    assert!(entry.care_info.is_empty());
}

#[test]
fn care_info_serializes_all_eleven_camel_case_fields() {
    let json = serde_json::to_value(CareInfo::default()).unwrap();
    let object = json.as_object().unwrap();

    let mut keys = object.keys().map(String::as_str).collect::<Vec<_>>();
    keys.sort_unstable();
    let mut expected = vec![
        "babyFeedingTime",
        "babyFeedingCount",
        "babyMilkAmount",
        "babyWaterCount",
        "babyWaterAmount",
        "babyExcretionCount",
        "babyAbnormal",
        "momUrinationCount",
        "momUrinationAmount",
        "momWipeCount",
        "momOther",
    ];
    expected.sort_unstable();
    assert_eq!(keys, expected);
    assert!(object.values().all(|value| value == ""));
    assert_eq!(CARE_FIELD_LABELS.len(), object.len());
}

#[test]
fn entry_timestamp_keeps_fractional_seconds_on_the_wire() {
    let created_at = NaiveDate::from_ymd_opt(2024, 5, 6)
        .unwrap()
        .and_hms_milli_opt(7, 8, 9, 125)
        .unwrap();
    let json = serde_json::to_value(CareEntry::new(0, created_at)).unwrap();
    assert_eq!(json["createdAt"], "2024-05-06T07:08:09.125");
}
