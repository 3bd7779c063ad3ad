//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose note list/create/update/delete to Dart via FRB.
//! - Own the process-wide note store and the runtime its writes run on.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - Store mutations return before persistence completes.
//! - Unknown ids on update/delete are reported as successful no-ops.

use log::error;
use notekeep_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    ImageRef, Note, NoteDraft, NoteStore, StoreConfig,
};
use once_cell::sync::OnceCell;
use std::path::PathBuf;
use tokio::runtime::Runtime;

static RUNTIME: OnceCell<Runtime> = OnceCell::new();
static STORE: OnceCell<NoteStore> = OnceCell::new();
static STORE_CONFIG: OnceCell<StoreConfig> = OnceCell::new();

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir`.
/// - Returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Sets the notes database file. Must precede the first note call.
///
/// # FFI contract
/// - Returns empty string on success and error message on failure.
/// - Repeating the same path is accepted; a different path is rejected.
#[flutter_rust_bridge::frb(sync)]
pub fn notes_configure_db_path(db_path: String) -> String {
    let trimmed = db_path.trim();
    if trimmed.is_empty() {
        return "db_path must not be empty".to_string();
    }

    let requested = PathBuf::from(trimmed);
    let active = STORE_CONFIG.get_or_init(|| StoreConfig::new(requested.clone()));
    if active.db_path == requested {
        String::new()
    } else {
        format!(
            "notes database already configured at `{}`",
            active.db_path.display()
        )
    }
}

/// Note projection handed to Dart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteItem {
    pub id: String,
    pub title: String,
    pub content: String,
    /// `None` when the note has no image.
    pub image_uri: Option<String>,
    /// Epoch milliseconds.
    pub created_at_ms: i64,
    /// Epoch milliseconds.
    pub updated_at_ms: i64,
}

impl From<&Note> for NoteItem {
    fn from(note: &Note) -> Self {
        Self {
            id: note.id().to_string(),
            title: note.title().to_string(),
            content: note.content().to_string(),
            image_uri: note.image_uri().map(|image| image.as_str().to_string()),
            created_at_ms: note.created_at().timestamp_millis(),
            updated_at_ms: note.updated_at().timestamp_millis(),
        }
    }
}

/// Generic action response envelope for note mutations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteActionResponse {
    /// Whether the call was accepted.
    pub ok: bool,
    /// The note after the mutation, when one exists.
    pub note: Option<NoteItem>,
    /// Human-readable response message for diagnostics/UI.
    pub message: String,
}

impl NoteActionResponse {
    fn success(message: impl Into<String>, note: Option<NoteItem>) -> Self {
        Self {
            ok: true,
            note,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            note: None,
            message: message.into(),
        }
    }
}

/// Lists notes, most recently created first.
///
/// Returns an empty list when the store cannot be opened.
#[flutter_rust_bridge::frb(sync)]
pub fn notes_list() -> Vec<NoteItem> {
    match note_store() {
        Ok(store) => store.list().iter().map(NoteItem::from).collect(),
        Err(err) => {
            error!("event=ffi_notes_list module=ffi status=error error={err}");
            Vec::new()
        }
    }
}

/// Gets one note for edit pre-fill.
#[flutter_rust_bridge::frb(sync)]
pub fn note_get(id: String) -> Option<NoteItem> {
    let store = note_store().ok()?;
    store.get_by_id(id.trim()).as_ref().map(NoteItem::from)
}

/// Creates a note from validated form input.
///
/// `image_uri`: `None` or blank means no image.
#[flutter_rust_bridge::frb(sync)]
pub fn note_create(title: String, content: String, image_uri: Option<String>) -> NoteActionResponse {
    match note_store() {
        Ok(store) => {
            let note = store.create(to_draft(title, content, image_uri));
            NoteActionResponse::success("Note created.", Some(NoteItem::from(&note)))
        }
        Err(err) => NoteActionResponse::failure(format!("note_create failed: {err}")),
    }
}

/// Replaces title, content and image of an existing note.
#[flutter_rust_bridge::frb(sync)]
pub fn note_update(
    id: String,
    title: String,
    content: String,
    image_uri: Option<String>,
) -> NoteActionResponse {
    let store = match note_store() {
        Ok(store) => store,
        Err(err) => return NoteActionResponse::failure(format!("note_update failed: {err}")),
    };

    match store.update(id.trim(), to_draft(title, content, image_uri)) {
        Some(note) => NoteActionResponse::success("Note updated.", Some(NoteItem::from(&note))),
        None => NoteActionResponse::success("No note with that id; nothing changed.", None),
    }
}

/// Deletes a note. Deleting an unknown id succeeds without changes.
#[flutter_rust_bridge::frb(sync)]
pub fn note_delete(id: String) -> NoteActionResponse {
    let store = match note_store() {
        Ok(store) => store,
        Err(err) => return NoteActionResponse::failure(format!("note_delete failed: {err}")),
    };

    if store.delete(id.trim()) {
        NoteActionResponse::success("Note deleted.", None)
    } else {
        NoteActionResponse::success("No note with that id; nothing changed.", None)
    }
}

fn to_draft(title: String, content: String, image_uri: Option<String>) -> NoteDraft {
    NoteDraft {
        title,
        content,
        image_uri: image_uri
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .map(ImageRef::from),
    }
}

fn runtime() -> Result<&'static Runtime, String> {
    RUNTIME.get_or_try_init(|| {
        tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("notekeep-io")
            .build()
            .map_err(|err| format!("runtime start failed: {err}"))
    })
}

fn note_store() -> Result<&'static NoteStore, String> {
    STORE.get_or_try_init(|| {
        let config = STORE_CONFIG.get_or_init(|| StoreConfig::from_env_or(std::env::temp_dir()));
        runtime()?
            .block_on(NoteStore::open_with_config(config))
            .map_err(|err| format!("notes store open failed: {err}"))
    })
}
