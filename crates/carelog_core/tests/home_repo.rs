use carelog_core::db::open_db_in_memory;
use carelog_core::repo::home_repo::{KEY_ITEMS, KEY_NEXT_ID};
use carelog_core::{CareEntry, Client, HomeRepository, PreferenceStore, SqlitePreferenceStore};
use chrono::{NaiveDate, NaiveDateTime};

fn at(day: u32, hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, day)
        .unwrap()
        .and_hms_opt(hour, 0, 0)
        .unwrap()
}

#[test]
fn empty_store_loads_empty_collection_with_zero_counter() {
    let conn = open_db_in_memory().unwrap();
    let repo = HomeRepository::new(SqlitePreferenceStore::new(&conn));

    let snapshot = repo.load().unwrap();
    assert!(snapshot.clients.is_empty());
    assert_eq!(snapshot.next_client_id, 0);
}

#[test]
fn save_then_load_restores_clients_and_counter() {
    let conn = open_db_in_memory().unwrap();
    let repo = HomeRepository::new(SqlitePreferenceStore::new(&conn));

    let mut older = Client::new(0, "张女士", at(1, 8));
    older.entries.push(CareEntry::new(0, at(1, 9)));
    let mut newer = Client::new(1, "李女士", at(2, 8));
    newer.color = carelog_core::palette::pack_argb(0xFF00_9688);
    newer.entries.push(CareEntry::new(0, at(2, 9)));
    newer.entries.push(CareEntry::new(1, at(3, 9)));
    newer.entries[0].care_info.baby_milk_amount = "60ml".to_string();

    repo.save(&[older, newer.clone()], 7).unwrap();
    let snapshot = repo.load_at(at(9, 0)).unwrap();

    assert_eq!(snapshot.next_client_id, 7);
    assert_eq!(
        snapshot.clients.iter().map(|c| c.id).collect::<Vec<_>>(),
        vec![1, 0]
    );
    let loaded = &snapshot.clients[0];
    assert_eq!(loaded.color, newer.color);
    assert_eq!(
        loaded.entries.iter().map(|e| e.id).collect::<Vec<_>>(),
        vec![1, 0]
    );
    assert_eq!(loaded.entries[1].care_info.baby_milk_amount, "60ml");
}

#[test]
fn stale_counter_is_raised_past_highest_client_id() {
    let conn = open_db_in_memory().unwrap();
    let store = SqlitePreferenceStore::new(&conn);
    store
        .put_string(
            KEY_ITEMS,
            r#"[{"id":5,"title":"A","createdAt":"2024-01-01T08:00:00"}]"#,
        )
        .unwrap();
    store.put_int(KEY_NEXT_ID, 2).unwrap();

    let snapshot = HomeRepository::new(store).load_at(at(9, 0)).unwrap();
    assert_eq!(snapshot.next_client_id, 6);
}

#[test]
fn corrupt_blob_loads_as_empty_but_keeps_counter() {
    let conn = open_db_in_memory().unwrap();
    let store = SqlitePreferenceStore::new(&conn);
    store.put_string(KEY_ITEMS, "{not json").unwrap();
    store.put_int(KEY_NEXT_ID, 3).unwrap();

    let snapshot = HomeRepository::new(store).load_at(at(9, 0)).unwrap();
    assert!(snapshot.clients.is_empty());
    assert_eq!(snapshot.next_client_id, 3);
}

#[test]
fn maximal_client_id_loads_without_overflowing_counter() {
    let conn = open_db_in_memory().unwrap();
    let store = SqlitePreferenceStore::new(&conn);
    store
        .put_string(
            KEY_ITEMS,
            r#"[{"id":9223372036854775807,"title":"A","createdAt":"2024-01-01T08:00:00"}]"#,
        )
        .unwrap();
    store.put_int(KEY_NEXT_ID, 4).unwrap();

    let snapshot = HomeRepository::new(store).load_at(at(9, 0)).unwrap();
    assert_eq!(snapshot.clients[0].id, i64::MAX);
    assert_eq!(snapshot.next_client_id, i64::MAX);
}

#[test]
fn out_of_range_float_ids_fall_back_to_defaults() {
    let conn = open_db_in_memory().unwrap();
    let store = SqlitePreferenceStore::new(&conn);
    store
        .put_string(
            KEY_ITEMS,
            r#"[{"id":1e30,"title":"A","createdAt":"2024-01-01T08:00:00","entries":[
                {"id":1e30,"title":"e","createdAt":"2024-01-01T09:00:00"}
            ]}]"#,
        )
        .unwrap();

    let snapshot = HomeRepository::new(store).load_at(at(9, 0)).unwrap();
    let client = &snapshot.clients[0];
    assert_eq!(client.id, 0);
    assert_eq!(client.entries[0].id, 0);
    assert_eq!(snapshot.next_client_id, 1);
}
