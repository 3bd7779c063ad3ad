//! Core note storage for Notekeep.
//! This crate owns the note collection and its local persistence.

pub mod config;
pub mod db;
pub mod kv;
pub mod logging;
pub mod model;
pub mod persistence;
pub mod store;

pub use config::StoreConfig;
pub use kv::{KeyValueStore, MemoryKvStore, SqliteKvStore, StorageError, StorageResult};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::note::{ImageRef, Note, NoteDraft, NoteId};
pub use persistence::codec::{decode_notes, encode_notes, CodecError, DecodedNotes};
pub use persistence::{NoteList, NotePersistence, DEFAULT_NOTES_KEY};
pub use store::{Clock, NoteStore, SystemClock};

/// Minimal health-check API for host integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
