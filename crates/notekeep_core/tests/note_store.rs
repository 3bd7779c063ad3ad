mod common;

use common::{open_store, seeded_storage, ManualClock, ProbeKvStore, SEEDED_NOTES};
use notekeep_core::{
    decode_notes, ImageRef, KeyValueStore, MemoryKvStore, NoteDraft, SystemClock,
    DEFAULT_NOTES_KEY,
};
use std::sync::Arc;

const T0: i64 = 1_714_555_800_000;

#[tokio::test]
async fn create_on_empty_store_lists_one_fresh_note() {
    let store = open_store(Arc::new(MemoryKvStore::new()), Arc::new(SystemClock)).await;
    assert!(store.is_empty());

    let created = store.create(NoteDraft::new("Groceries", "Milk, eggs, bread"));

    let notes = store.list();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0], created);
    assert_eq!(created.title(), "Groceries");
    assert_eq!(created.content(), "Milk, eggs, bread");
    assert!(!created.id().as_str().is_empty());
    assert_eq!(created.created_at(), created.updated_at());
    assert!(created.image_uri().is_none());
}

#[tokio::test]
async fn creates_are_listed_most_recent_first() {
    let clock = ManualClock::at_millis(T0);
    let store = open_store(Arc::new(MemoryKvStore::new()), clock.clone()).await;

    let mut created_ids = Vec::new();
    for index in 0..5 {
        created_ids.push(store.create(NoteDraft::new(format!("note {index}"), "body")).id().clone());
        clock.advance_millis(10);
    }

    let listed: Vec<_> = store.list().iter().map(|note| note.id().clone()).collect();
    created_ids.reverse();
    assert_eq!(listed, created_ids);
}

#[tokio::test]
async fn create_keeps_image_reference_untouched() {
    let store = open_store(Arc::new(MemoryKvStore::new()), Arc::new(SystemClock)).await;
    let created = store.create(
        NoteDraft::new("Receipt", "Lunch").with_image("content://media/external/images/42"),
    );
    assert_eq!(
        created.image_uri(),
        Some(&ImageRef::new("content://media/external/images/42"))
    );
}

#[tokio::test]
async fn hydrated_store_keeps_persisted_order() {
    let store = open_store(seeded_storage(SEEDED_NOTES), Arc::new(SystemClock)).await;

    let ids: Vec<String> = store
        .list()
        .iter()
        .map(|note| note.id().to_string())
        .collect();
    assert_eq!(ids, vec!["b2", "a1"]);
}

#[tokio::test]
async fn update_replaces_fields_and_refreshes_updated_at() {
    let clock = ManualClock::at_millis(T0 + 86_400_000 * 30);
    let store = open_store(seeded_storage(SEEDED_NOTES), clock.clone()).await;
    let before = store.get_by_id("a1").unwrap();

    let returned = store
        .update(
            "a1",
            NoteDraft::new("Groceries v2", "Milk, eggs, bread, butter"),
        )
        .unwrap();

    let after = store.get_by_id("a1").unwrap();
    assert_eq!(returned, after);
    assert_eq!(after.id(), before.id());
    assert_eq!(after.created_at(), before.created_at());
    assert!(after.updated_at() > before.updated_at());
    assert_eq!(after.title(), "Groceries v2");
    assert_eq!(after.content(), "Milk, eggs, bread, butter");
    assert_eq!(after.image_uri(), None);
}

#[tokio::test]
async fn update_does_not_move_the_note() {
    let store = open_store(seeded_storage(SEEDED_NOTES), Arc::new(SystemClock)).await;

    store.update("a1", NoteDraft::new("Groceries", "edited"));

    let ids: Vec<String> = store
        .list()
        .iter()
        .map(|note| note.id().to_string())
        .collect();
    assert_eq!(ids, vec!["b2", "a1"]);
}

#[tokio::test]
async fn repeated_updates_in_the_same_millisecond_still_advance() {
    let clock = ManualClock::at_millis(T0);
    let store = open_store(Arc::new(MemoryKvStore::new()), clock).await;
    let created = store.create(NoteDraft::new("t", "c"));

    let mut previous = created.updated_at();
    for round in 0..3 {
        store.update(created.id().as_str(), NoteDraft::new("t", format!("c{round}")));
        let current = store.get_by_id(created.id().as_str()).unwrap().updated_at();
        assert!(current > previous);
        previous = current;
    }
}

#[tokio::test]
async fn unknown_ids_leave_collection_and_storage_untouched() {
    let storage = Arc::new(ProbeKvStore::default());
    let store = open_store(storage.clone(), Arc::new(SystemClock)).await;
    store.create(NoteDraft::new("keep", "me"));
    store.flush().await;
    let writes_before = storage.writes();
    let before = store.list();

    assert!(store.update("missing", NoteDraft::new("x", "y")).is_none());
    assert!(!store.delete("missing"));
    store.flush().await;

    assert_eq!(store.list(), before);
    assert_eq!(storage.writes(), writes_before);
}

#[tokio::test]
async fn delete_removes_note_and_is_idempotent() {
    let store = open_store(seeded_storage(SEEDED_NOTES), Arc::new(SystemClock)).await;

    assert!(store.delete("b2"));
    let once = store.list();
    assert!(!store.delete("b2"));

    assert_eq!(store.list(), once);
    assert_eq!(once.len(), 1);
    assert!(store.get_by_id("b2").is_none());
    assert!(store.get_by_id("a1").is_some());
}

#[tokio::test]
async fn get_by_id_is_a_pure_lookup() {
    let storage = Arc::new(ProbeKvStore::default());
    let store = open_store(storage.clone(), Arc::new(SystemClock)).await;
    let created = store.create(NoteDraft::new("t", "c"));
    store.flush().await;
    let writes = storage.writes();

    assert_eq!(store.get_by_id(created.id().as_str()), Some(created));
    assert_eq!(store.get_by_id("nope"), None);
    store.flush().await;
    assert_eq!(storage.writes(), writes);
}

#[tokio::test]
async fn listed_snapshot_is_not_affected_by_later_mutations() {
    let store = open_store(Arc::new(MemoryKvStore::new()), Arc::new(SystemClock)).await;
    let first = store.create(NoteDraft::new("first", "body"));
    let snapshot = store.list();

    store.update(first.id().as_str(), NoteDraft::new("renamed", "body"));
    store.create(NoteDraft::new("second", "body"));

    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].title(), "first");
}

#[tokio::test]
async fn subscribers_see_each_effective_mutation() {
    let store = open_store(Arc::new(MemoryKvStore::new()), Arc::new(SystemClock)).await;
    let mut changes = store.subscribe();
    assert!(changes.borrow_and_update().is_empty());

    let created = store.create(NoteDraft::new("t", "c"));
    assert!(changes.has_changed().unwrap());
    assert_eq!(changes.borrow_and_update()[0], created);

    store.delete("unknown");
    assert!(!changes.has_changed().unwrap());

    store.delete(created.id().as_str());
    assert!(changes.has_changed().unwrap());
    assert!(changes.borrow_and_update().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn persisted_state_matches_memory_after_burst_and_flush() {
    let storage = Arc::new(MemoryKvStore::new());
    let store = open_store(storage.clone(), Arc::new(SystemClock)).await;

    let mut ids = Vec::new();
    for index in 0..40 {
        let note = store.create(NoteDraft::new(format!("n{index}"), "body"));
        ids.push(note.id().clone());
        if index % 3 == 0 {
            store.update(note.id().as_str(), NoteDraft::new(format!("n{index}!"), "edited"));
        }
        if index % 5 == 0 {
            store.delete(ids[index / 2].as_str());
        }
    }
    store.flush().await;

    let raw = storage.get_item(DEFAULT_NOTES_KEY).unwrap().unwrap();
    let persisted = decode_notes(&raw).unwrap();
    assert!(persisted.issues.is_empty());
    assert_eq!(persisted.notes.as_slice(), &store.list()[..]);
}

#[tokio::test]
async fn write_failures_never_reach_the_caller() {
    let storage = Arc::new(ProbeKvStore::failing());
    let store = open_store(storage.clone(), Arc::new(SystemClock)).await;
    assert!(store.is_empty());

    let created = store.create(NoteDraft::new("offline", "still here"));
    store.flush().await;
    store.update(created.id().as_str(), NoteDraft::new("offline", "edited"));
    store.flush().await;

    assert_eq!(store.len(), 1);
    assert_eq!(store.get_by_id(created.id().as_str()).unwrap().content(), "edited");
    assert_eq!(storage.writes(), 2);
}
