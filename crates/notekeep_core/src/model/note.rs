//! Note domain model.
//!
//! # Responsibility
//! - Define the `Note` record held by the note store.
//! - Define `NoteDraft`, the caller-supplied payload for create/update.
//!
//! # Invariants
//! - `id` is assigned once by the store and never reused or changed.
//! - `created_at <= updated_at`.
//! - Fields are read-only outside this crate; mutation goes through the store.
//!
//! # See also
//! - crate::store

use chrono::{DateTime, Utc};
use std::fmt::{Display, Formatter};

/// Opaque, stable note identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NoteId(String);

impl NoteId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for NoteId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NoteId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for NoteId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Uninterpreted reference to an image resource (file path, content URI).
///
/// Core never dereferences or validates the target.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageRef(String);

impl ImageRef {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl From<&str> for ImageRef {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ImageRef {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Editable note fields supplied by the form layer.
///
/// Title/content emptiness is the caller's responsibility; the store
/// accepts drafts as-is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteDraft {
    pub title: String,
    pub content: String,
    pub image_uri: Option<ImageRef>,
}

impl NoteDraft {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            image_uri: None,
        }
    }

    /// Attaches an image reference to this draft.
    pub fn with_image(mut self, image_uri: impl Into<ImageRef>) -> Self {
        self.image_uri = Some(image_uri.into());
        self
    }
}

/// A persisted user note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    id: NoteId,
    title: String,
    content: String,
    image_uri: Option<ImageRef>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Note {
    /// Builds a fresh note with `created_at == updated_at == now`.
    pub(crate) fn create(id: NoteId, draft: NoteDraft, now: DateTime<Utc>) -> Self {
        Self {
            id,
            title: draft.title,
            content: draft.content,
            image_uri: draft.image_uri,
            created_at: now,
            updated_at: now,
        }
    }

    /// Rebuilds a note from persisted parts.
    ///
    /// Callers must check `created_at <= updated_at` beforehand.
    pub(crate) fn restore(
        id: NoteId,
        draft: NoteDraft,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            title: draft.title,
            content: draft.content,
            image_uri: draft.image_uri,
            created_at,
            updated_at,
        }
    }

    /// Full replacement of editable fields plus timestamp refresh.
    pub(crate) fn apply(&mut self, draft: NoteDraft, updated_at: DateTime<Utc>) {
        self.title = draft.title;
        self.content = draft.content;
        self.image_uri = draft.image_uri;
        self.updated_at = updated_at;
    }

    pub fn id(&self) -> &NoteId {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn image_uri(&self) -> Option<&ImageRef> {
        self.image_uri.as_ref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns the editable fields as a draft, e.g. to pre-fill an edit form.
    pub fn to_draft(&self) -> NoteDraft {
        NoteDraft {
            title: self.title.clone(),
            content: self.content.clone(),
            image_uri: self.image_uri.clone(),
        }
    }
}
