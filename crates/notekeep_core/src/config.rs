//! Store configuration supplied by the composition root.

use crate::persistence::DEFAULT_NOTES_KEY;
use std::path::PathBuf;

/// Environment variable consulted by hosts that do not pass a database path.
pub const DB_PATH_ENV: &str = "NOTEKEEP_DB_PATH";

/// File name used when the host provides only a directory.
pub const DEFAULT_DB_FILE_NAME: &str = "notekeep.sqlite3";

/// Where and under which key the note collection is persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// SQLite database file backing the key-value store.
    pub db_path: PathBuf,
    /// Key of the single entry holding the serialized collection.
    pub storage_key: String,
}

impl StoreConfig {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
            storage_key: DEFAULT_NOTES_KEY.to_string(),
        }
    }

    /// Places the database under `dir` using `DEFAULT_DB_FILE_NAME`.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self::new(dir.into().join(DEFAULT_DB_FILE_NAME))
    }

    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }

    /// Resolves the database path from `DB_PATH_ENV`, falling back to
    /// `fallback_dir/DEFAULT_DB_FILE_NAME` when unset or blank.
    pub fn from_env_or(fallback_dir: impl Into<PathBuf>) -> Self {
        match std::env::var(DB_PATH_ENV) {
            Ok(raw) if !raw.trim().is_empty() => Self::new(raw.trim()),
            _ => Self::in_dir(fallback_dir),
        }
    }
}
