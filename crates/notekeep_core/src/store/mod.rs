//! Note store: the authoritative in-memory note collection.
//!
//! # Responsibility
//! - Own the ordered note collection and its create/update/delete/lookup APIs.
//! - Write every effective mutation through to persistence in the background.
//! - Publish collection snapshots to subscribers.
//!
//! # Invariants
//! - New notes are prepended; updates never move a note.
//! - Ids are unique within the collection.
//! - `created_at <= updated_at`, and `updated_at` strictly increases on update.
//! - Mutations are applied one at a time under the state lock; readers only
//!   see whole snapshots.
//! - Unknown ids make `update`/`delete` silent no-ops with no write-through.
//! - Mutators never wait for persistence.

mod clock;
mod id;

pub use clock::{Clock, SystemClock};

use crate::config::StoreConfig;
use crate::kv::{SqliteKvStore, StorageError, StorageResult};
use crate::model::note::{Note, NoteDraft};
use crate::persistence::{NoteList, NotePersistence, WriteOutcome};
use id::generate_note_id;
use log::{debug, info, warn};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Single owner of the note collection.
///
/// Share it behind an `Arc` from the composition root; every UI surface
/// reads and mutates through the same instance.
pub struct NoteStore {
    notes: Mutex<NoteList>,
    changes: watch::Sender<NoteList>,
    persistence: Arc<NotePersistence>,
    clock: Arc<dyn Clock>,
    runtime: Handle,
    in_flight: Mutex<Vec<JoinHandle<WriteOutcome>>>,
}

impl NoteStore {
    /// Hydrates a store from `persistence` using the system clock.
    ///
    /// Must run inside a tokio runtime; write-throughs are spawned on it.
    pub async fn open(persistence: NotePersistence) -> Self {
        Self::open_with_clock(persistence, Arc::new(SystemClock)).await
    }

    /// Hydrates a store with an explicit time source.
    pub async fn open_with_clock(persistence: NotePersistence, clock: Arc<dyn Clock>) -> Self {
        let loaded = persistence.load().await;
        let notes: NoteList = loaded.into();
        let (changes, _) = watch::channel(notes.clone());

        info!(
            "event=store_ready module=store status=ok note_count={}",
            notes.len()
        );

        Self {
            notes: Mutex::new(notes),
            changes,
            persistence: Arc::new(persistence),
            clock,
            runtime: Handle::current(),
            in_flight: Mutex::new(Vec::new()),
        }
    }

    /// Opens the SQLite backend described by `config` and hydrates from it.
    ///
    /// # Errors
    /// - Returns `StorageError` when the database cannot be opened or migrated.
    ///   Unreadable note payloads still hydrate as an empty collection.
    pub async fn open_with_config(config: &StoreConfig) -> StorageResult<Self> {
        let db_path = config.db_path.clone();
        let storage = tokio::task::spawn_blocking(move || SqliteKvStore::open(db_path))
            .await
            .map_err(|err| StorageError::Unavailable(format!("storage open task failed: {err}")))??;
        let persistence = NotePersistence::with_key(Arc::new(storage), config.storage_key.clone());
        Ok(Self::open(persistence).await)
    }

    /// Creates a note from an already-validated draft and prepends it.
    pub fn create(&self, draft: NoteDraft) -> Note {
        let mut notes = self.lock_notes();
        let now = clock::stamp(self.clock.as_ref());
        let id = generate_note_id(now, |candidate| {
            notes.iter().any(|note| note.id().as_str() == candidate)
        });
        let note = Note::create(id, draft, now);

        let mut next = Vec::with_capacity(notes.len() + 1);
        next.push(note.clone());
        next.extend(notes.iter().cloned());
        self.commit(&mut notes, next);

        info!(
            "event=note_create module=store status=ok note_id={} note_count={}",
            note.id(),
            notes.len()
        );
        note
    }

    /// Replaces title, content and image of note `id`.
    ///
    /// Returns the updated note, or `None` when `id` is unknown and nothing
    /// changed.
    pub fn update(&self, id: &str, draft: NoteDraft) -> Option<Note> {
        let mut notes = self.lock_notes();
        let Some(index) = notes.iter().position(|note| note.id().as_str() == id) else {
            debug!("event=note_update module=store status=noop reason=not_found note_id={id}");
            return None;
        };

        let mut next = notes.to_vec();
        let updated_at = clock::advance(self.clock.as_ref(), next[index].updated_at());
        next[index].apply(draft, updated_at);
        let updated = next[index].clone();
        self.commit(&mut notes, next);

        info!("event=note_update module=store status=ok note_id={id}");
        Some(updated)
    }

    /// Removes note `id`. Unknown ids are ignored, so repeated calls are safe.
    ///
    /// Returns whether a note was removed.
    pub fn delete(&self, id: &str) -> bool {
        let mut notes = self.lock_notes();
        let Some(index) = notes.iter().position(|note| note.id().as_str() == id) else {
            debug!("event=note_delete module=store status=noop reason=not_found note_id={id}");
            return false;
        };

        let mut next = notes.to_vec();
        next.remove(index);
        self.commit(&mut notes, next);

        info!(
            "event=note_delete module=store status=ok note_id={id} note_count={}",
            notes.len()
        );
        true
    }

    /// Looks up one note.
    pub fn get_by_id(&self, id: &str) -> Option<Note> {
        self.lock_notes()
            .iter()
            .find(|note| note.id().as_str() == id)
            .cloned()
    }

    /// Current collection, most recently created first.
    pub fn list(&self) -> NoteList {
        self.lock_notes().clone()
    }

    pub fn len(&self) -> usize {
        self.lock_notes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock_notes().is_empty()
    }

    /// Receives the latest collection after every effective mutation.
    pub fn subscribe(&self) -> watch::Receiver<NoteList> {
        self.changes.subscribe()
    }

    /// Waits for every write-through dispatched so far to settle.
    ///
    /// Mutators never call this; it is for shutdown paths and tests.
    pub async fn flush(&self) {
        let pending = std::mem::take(&mut *self.lock_in_flight());
        for handle in pending {
            if let Err(err) = handle.await {
                warn!("event=store_flush module=store status=error error={err}");
            }
        }
    }

    fn commit(&self, notes: &mut MutexGuard<'_, NoteList>, next: Vec<Note>) {
        let snapshot: NoteList = next.into();
        **notes = snapshot.clone();

        // Stamped under the state lock so write generations follow mutation order.
        let write = self.persistence.prepare_write(snapshot.clone());
        let handle = self.runtime.spawn(write.run());
        {
            let mut in_flight = self.lock_in_flight();
            in_flight.retain(|pending| !pending.is_finished());
            in_flight.push(handle);
        }

        self.changes.send_replace(snapshot);
    }

    fn lock_notes(&self) -> MutexGuard<'_, NoteList> {
        self.notes.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_in_flight(&self) -> MutexGuard<'_, Vec<JoinHandle<WriteOutcome>>> {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
