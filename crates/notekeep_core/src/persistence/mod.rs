//! Persistence adapter between the note store and key-value storage.
//!
//! # Responsibility
//! - Load the persisted collection once at startup.
//! - Write full-collection snapshots back on every mutation.
//!
//! # Invariants
//! - `load` never fails: missing, unreadable or non-array data yields an
//!   empty collection and a log event. Individual bad entries are dropped or
//!   repaired with a warning; the remaining notes still load.
//! - `save` never fails: write errors are logged and dropped.
//! - Generations are stamped in mutation order by `prepare_write`. Once a
//!   generation has been attempted, written or failed, no older one is
//!   written. The blob therefore never moves backwards.

pub mod codec;

use crate::kv::KeyValueStore;
use crate::model::note::Note;
use codec::{decode_notes, encode_notes, CodecError};
use log::{debug, error, info, warn};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

/// Storage key holding the serialized note collection.
pub const DEFAULT_NOTES_KEY: &str = "notes";

/// Immutable, cheaply cloned view of the note collection.
pub type NoteList = Arc<[Note]>;

/// Result of one background write, reported for diagnostics only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    /// A newer snapshot had already been written.
    Superseded,
    Failed,
}

/// Translates the note collection to and from one key-value entry.
pub struct NotePersistence {
    storage: Arc<dyn KeyValueStore>,
    key: String,
    next_generation: AtomicU64,
    last_written: Mutex<u64>,
}

impl NotePersistence {
    /// Creates an adapter using `DEFAULT_NOTES_KEY`.
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self::with_key(storage, DEFAULT_NOTES_KEY)
    }

    pub fn with_key(storage: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
            next_generation: AtomicU64::new(1),
            last_written: Mutex::new(0),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Reads the persisted collection.
    ///
    /// Returns an empty collection on first run and on any read or decode
    /// failure.
    pub async fn load(&self) -> Vec<Note> {
        let started_at = Instant::now();
        let storage = Arc::clone(&self.storage);
        let key = self.key.clone();

        let read = tokio::task::spawn_blocking(move || storage.get_item(&key)).await;
        let raw = match read {
            Ok(Ok(Some(raw))) => raw,
            Ok(Ok(None)) => {
                info!(
                    "event=notes_load module=persistence status=ok note_count=0 first_run=true duration_ms={}",
                    started_at.elapsed().as_millis()
                );
                return Vec::new();
            }
            Ok(Err(err)) => {
                error!(
                    "event=notes_load module=persistence status=error error_code=storage_read_failed error={err}"
                );
                return Vec::new();
            }
            Err(err) => {
                error!(
                    "event=notes_load module=persistence status=error error_code=storage_task_failed error={err}"
                );
                return Vec::new();
            }
        };

        match decode_notes(&raw) {
            Ok(decoded) => {
                for issue in &decoded.issues {
                    warn!(
                        "event=notes_load module=persistence status=degraded error_code={} error={issue}",
                        issue_code(issue)
                    );
                }
                info!(
                    "event=notes_load module=persistence status=ok note_count={} issue_count={} payload_bytes={} duration_ms={}",
                    decoded.notes.len(),
                    decoded.issues.len(),
                    raw.len(),
                    started_at.elapsed().as_millis()
                );
                decoded.notes
            }
            Err(err) => {
                warn!(
                    "event=notes_load module=persistence status=error error_code=payload_corrupt payload_bytes={} error={err}",
                    raw.len()
                );
                Vec::new()
            }
        }
    }

    /// Writes `notes` as the persisted collection.
    ///
    /// Best-effort: failures are logged, never returned.
    pub async fn save(self: &Arc<Self>, notes: NoteList) {
        self.prepare_write(notes).run().await;
    }

    /// Stamps a snapshot with the next write generation.
    ///
    /// Must be called in mutation order; the returned write may then run on
    /// any task at any time.
    pub fn prepare_write(self: &Arc<Self>, notes: NoteList) -> PendingWrite {
        PendingWrite {
            persistence: Arc::clone(self),
            generation: self.next_generation.fetch_add(1, Ordering::Relaxed),
            notes,
        }
    }

    fn write_blocking(&self, generation: u64, notes: &[Note]) -> WriteOutcome {
        let mut last_written = self
            .last_written
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if generation < *last_written {
            debug!(
                "event=notes_save module=persistence status=skipped generation={generation} last_written={}",
                *last_written
            );
            return WriteOutcome::Superseded;
        }

        let payload = match encode_notes(notes) {
            Ok(payload) => payload,
            Err(err) => {
                error!(
                    "event=notes_save module=persistence status=error generation={generation} error_code=encode_failed error={err}"
                );
                return WriteOutcome::Failed;
            }
        };

        match self.storage.set_item(&self.key, &payload) {
            Ok(()) => {
                *last_written = generation;
                WriteOutcome::Written
            }
            Err(err) => {
                // Older snapshots stay behind a failed newer one.
                *last_written = generation;
                error!(
                    "event=notes_save module=persistence status=error generation={generation} error_code=storage_write_failed error={err}"
                );
                WriteOutcome::Failed
            }
        }
    }
}

fn issue_code(issue: &CodecError) -> &'static str {
    match issue {
        CodecError::Json(_) => "payload_corrupt",
        CodecError::Entry { .. } => "entry_dropped",
        CodecError::Timestamp { .. } => "timestamp_invalid",
        CodecError::TimestampOrder(_) => "timestamp_clamped",
        CodecError::DuplicateId(_) => "duplicate_dropped",
    }
}

/// A stamped snapshot waiting to be written.
pub struct PendingWrite {
    persistence: Arc<NotePersistence>,
    generation: u64,
    notes: NoteList,
}

impl PendingWrite {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Performs the blocking write off the async worker threads.
    pub async fn run(self) -> WriteOutcome {
        let started_at = Instant::now();
        let generation = self.generation;
        let note_count = self.notes.len();
        let persistence = self.persistence;
        let notes = self.notes;

        let outcome =
            match tokio::task::spawn_blocking(move || persistence.write_blocking(generation, &notes))
                .await
            {
                Ok(outcome) => outcome,
                Err(err) => {
                    error!(
                        "event=notes_save module=persistence status=error generation={generation} error_code=storage_task_failed error={err}"
                    );
                    WriteOutcome::Failed
                }
            };

        if outcome == WriteOutcome::Written {
            debug!(
                "event=notes_save module=persistence status=ok generation={generation} note_count={note_count} duration_ms={}",
                started_at.elapsed().as_millis()
            );
        }
        outcome
    }
}
