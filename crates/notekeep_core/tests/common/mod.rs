#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use notekeep_core::{
    Clock, KeyValueStore, MemoryKvStore, NotePersistence, NoteStore, StorageError, StorageResult,
    DEFAULT_NOTES_KEY,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Clock that only moves when told to.
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn at_millis(millis: i64) -> Arc<Self> {
        Arc::new(Self {
            now: Mutex::new(Utc.timestamp_millis_opt(millis).unwrap()),
        })
    }

    pub fn advance_millis(&self, millis: i64) {
        let mut now = self.now.lock().unwrap();
        *now += Duration::milliseconds(millis);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

/// Memory storage that counts writes and can be told to fail.
#[derive(Default)]
pub struct ProbeKvStore {
    inner: MemoryKvStore,
    writes: AtomicUsize,
    fail_reads: bool,
    fail_writes: bool,
}

impl ProbeKvStore {
    pub fn failing() -> Self {
        Self {
            fail_reads: true,
            fail_writes: true,
            ..Self::default()
        }
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl KeyValueStore for ProbeKvStore {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        if self.fail_reads {
            return Err(StorageError::Unavailable("read refused".to_string()));
        }
        self.inner.get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes {
            return Err(StorageError::Unavailable("disk full".to_string()));
        }
        self.inner.set_item(key, value)
    }
}

/// Two persisted notes: `b2` (created later, listed first) and `a1`.
pub const SEEDED_NOTES: &str = r#"[
    {"id":"b2","title":"Call mom","content":"Sunday afternoon",
     "createdAt":"2024-05-02T08:00:00.000Z","updatedAt":"2024-05-02T08:00:00.000Z"},
    {"id":"a1","title":"Groceries","content":"Milk, eggs, bread","imageUri":"file:///photos/list.jpg",
     "createdAt":"2024-05-01T09:30:00.000Z","updatedAt":"2024-05-01T09:45:00.000Z"}
]"#;

pub fn seeded_storage(raw: &str) -> Arc<MemoryKvStore> {
    let storage = Arc::new(MemoryKvStore::new());
    storage.set_item(DEFAULT_NOTES_KEY, raw).unwrap();
    storage
}

pub async fn open_store(storage: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> NoteStore {
    NoteStore::open_with_clock(NotePersistence::new(storage), clock).await
}
