use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use jotpad_core::{KeyValueStore, KvError, MemoryKeyValueStore, Note, NoteStore, StoreError};

const KEY: &str = "notes";

fn at(seconds: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap() + TimeDelta::seconds(seconds)
}

fn note(id: i64, title: &str, content: &str) -> Note {
    let mut note = Note::new(id, at(id));
    note.title = title.to_string();
    note.content = content.to_string();
    note
}

fn empty_store() -> NoteStore<MemoryKeyValueStore> {
    NoteStore::load(MemoryKeyValueStore::new(), KEY)
}

#[test]
fn add_then_get_returns_equal_note() {
    let mut store = empty_store();
    let original = note(1, "Groceries", "milk");

    store.add(original.clone()).unwrap();
    assert_eq!(store.get(1), Some(original));
}

#[test]
fn add_inserts_at_front() {
    let mut store = empty_store();
    store.add(note(1, "first", "")).unwrap();
    store.add(note(2, "second", "")).unwrap();

    let ids: Vec<i64> = store.list().iter().map(|note| note.id).collect();
    assert_eq!(ids, vec![2, 1]);
}

#[test]
fn add_rejects_duplicate_id_without_writing() {
    let mut store = empty_store();
    store.add(note(1, "first", "")).unwrap();

    let err = store.add(note(1, "again", "")).unwrap_err();
    assert!(matches!(err, StoreError::DuplicateId(1)));
    assert_eq!(store.len(), 1);
    assert_eq!(store.get(1).unwrap().title, "first");
}

#[test]
fn list_returns_a_detached_copy() {
    let mut store = empty_store();
    store.add(note(1, "keep", "")).unwrap();

    let mut listed = store.list();
    listed[0].title = "mutated".to_string();
    listed.clear();

    assert_eq!(store.get(1).unwrap().title, "keep");
}

#[test]
fn update_replaces_fields_but_keeps_created() {
    let mut store = empty_store();
    store.add(note(1, "draft", "")).unwrap();

    let mut edited = note(1, "final", "body");
    edited.created = at(-500);
    edited.updated = at(60);
    store.update(edited).unwrap();

    let stored = store.get(1).unwrap();
    assert_eq!(stored.title, "final");
    assert_eq!(stored.content, "body");
    assert_eq!(stored.created, at(1));
    assert_eq!(stored.updated, at(60));
}

#[test]
fn update_unknown_id_signals_not_found() {
    let mut store = empty_store();
    let err = store.update(note(9, "ghost", "")).unwrap_err();
    assert!(matches!(err, StoreError::NotFound(9)));
    assert!(store.is_empty());
}

#[test]
fn delete_removes_and_is_idempotent() {
    let mut store = empty_store();
    store.add(note(1, "doomed", "")).unwrap();

    store.delete(1).unwrap();
    assert_eq!(store.get(1), None);
    store.delete(1).unwrap();
    store.delete(42).unwrap();
}

#[test]
fn search_is_case_insensitive_over_title_and_content() {
    let mut store = empty_store();
    store.add(note(1, "Groceries", "milk, eggs")).unwrap();
    store.add(note(2, "Work", "Quarterly REPORT")).unwrap();
    store.add(note(3, "Ideas", "")).unwrap();

    let all: Vec<i64> = store.search("").iter().map(|note| note.id).collect();
    assert_eq!(all, vec![3, 2, 1]);

    let report: Vec<i64> = store.search("report").iter().map(|note| note.id).collect();
    assert_eq!(report, vec![2]);

    let groceries: Vec<i64> = store.search("GROC").iter().map(|note| note.id).collect();
    assert_eq!(groceries, vec![1]);

    assert!(store.search("xyz").is_empty());
}

#[test]
fn every_mutation_writes_the_exact_json_shape() {
    let mut store = empty_store();
    store.add(note(1, "Groceries", "milk")).unwrap();

    let raw = store.backend().get(KEY).unwrap().expect("value should be written");
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let record = &value.as_array().expect("notes are stored as an array")[0];
    let mut fields: Vec<&str> = record
        .as_object()
        .unwrap()
        .keys()
        .map(String::as_str)
        .collect();
    fields.sort_unstable();

    assert_eq!(fields, vec!["content", "created", "id", "title", "updated"]);
    assert_eq!(record["id"], 1);
    assert_eq!(record["created"], "2024-05-01T12:00:01.000Z");

    store.delete(1).unwrap();
    assert_eq!(store.backend().get(KEY).unwrap().as_deref(), Some("[]"));
}

#[test]
fn load_reads_back_persisted_notes_in_order() {
    let mut store = empty_store();
    store.add(note(1, "older", "")).unwrap();
    store.add(note(2, "newer", "")).unwrap();

    let reloaded = NoteStore::load(store.backend().clone(), KEY);
    assert_eq!(reloaded.list(), store.list());
}

#[test]
fn load_accepts_browser_written_timestamps() {
    let mut kv = MemoryKeyValueStore::new();
    kv.set(
        KEY,
        r#"[{"id":1714564800000,"title":"t","content":"c","created":"2024-05-01T12:00:00.000Z","updated":"2024-05-01T14:00:00+02:00"}]"#,
    )
    .unwrap();

    let store = NoteStore::load(kv, KEY);
    let loaded = store.get(1_714_564_800_000).unwrap();
    assert_eq!(loaded.created, loaded.updated);
}

#[test]
fn load_degrades_to_empty_on_absent_corrupt_or_unreadable_value() {
    assert!(empty_store().is_empty());

    let mut corrupt = MemoryKeyValueStore::new();
    corrupt.set(KEY, "{not json").unwrap();
    assert!(NoteStore::load(corrupt, KEY).is_empty());

    let mut wrong_shape = MemoryKeyValueStore::new();
    wrong_shape.set(KEY, r#"[{"id":"abc"}]"#).unwrap();
    assert!(NoteStore::load(wrong_shape, KEY).is_empty());

    let mut offline = MemoryKeyValueStore::new();
    offline.set_available(false);
    assert!(NoteStore::load(offline, KEY).is_empty());
}

#[test]
fn failed_write_keeps_memory_and_retry_succeeds() {
    let mut store = NoteStore::load(MemoryKeyValueStore::new().with_quota(16), KEY);

    let err = store.add(note(1, "a long enough title", "")).unwrap_err();
    assert!(matches!(
        err,
        StoreError::StorageUnavailable(KvError::QuotaExceeded { .. })
    ));
    assert!(store.is_dirty());
    assert_eq!(store.get(1).unwrap().title, "a long enough title");
    assert_eq!(store.backend().get(KEY).unwrap(), None);

    store.backend_mut().set_quota(None);
    store.save().unwrap();
    assert!(!store.is_dirty());
    assert!(store.backend().get(KEY).unwrap().is_some());
}

#[test]
fn allocate_id_never_repeats_within_one_millisecond() {
    let mut store = empty_store();
    let now = at(0);

    let first = store.allocate_id(now).unwrap();
    let second = store.allocate_id(now).unwrap();
    assert_eq!(first, now.timestamp_millis());
    assert_eq!(second, first + 1);

    store.add(Note::new(second, now)).unwrap();
    store.delete(second).unwrap();
    assert_eq!(store.allocate_id(now).unwrap(), second + 1);
}

#[test]
fn allocate_id_steps_past_loaded_ids() {
    let mut seeded = empty_store();
    seeded.add(Note::new(5_000_000_000_000, at(0))).unwrap();

    let mut store = NoteStore::load(seeded.backend().clone(), KEY);
    assert_eq!(store.allocate_id(at(0)).unwrap(), 5_000_000_000_001);
}

#[test]
fn allocate_id_reports_exhaustion_after_maximal_loaded_id() {
    let mut kv = MemoryKeyValueStore::new();
    kv.set(
        KEY,
        r#"[{"id":9223372036854775807,"title":"edge","content":"","created":"2024-05-01T12:00:00.000Z","updated":"2024-05-01T12:00:00.000Z"}]"#,
    )
    .unwrap();

    let mut store = NoteStore::load(kv, KEY);
    assert_eq!(store.len(), 1);
    assert!(matches!(
        store.allocate_id(at(0)),
        Err(StoreError::IdSpaceExhausted)
    ));
    assert!(matches!(
        store.allocate_id(at(0)),
        Err(StoreError::IdSpaceExhausted)
    ));
    assert_eq!(store.get(i64::MAX).unwrap().title, "edge");
}

#[test]
fn cards_follow_search_and_fallbacks() {
    let mut store = empty_store();
    store.add(note(1, "", "")).unwrap();
    store.add(note(2, "Groceries", "milk,\n eggs")).unwrap();

    let cards = store.cards("");
    assert_eq!(cards.len(), 2);
    assert_eq!(cards[0].heading, "Groceries");
    assert_eq!(cards[0].excerpt, "milk, eggs");
    assert_eq!(cards[1].heading, "Untitled");
    assert_eq!(cards[1].excerpt, "No content");

    assert_eq!(store.cards("eggs").len(), 1);
}
