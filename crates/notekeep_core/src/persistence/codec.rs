//! JSON storage representation of the note collection.
//!
//! # Responsibility
//! - Translate between `Note` (native `DateTime<Utc>`) and the persisted
//!   JSON array (ISO-8601 string dates).
//!
//! # Invariants
//! - Dates are written with millisecond precision and a `Z` suffix.
//! - Only a payload that is not a JSON array fails as a whole.
//! - Entries with missing fields or unparseable dates are dropped one by one.
//! - The first entry wins on duplicate ids.
//! - `updatedAt` earlier than `createdAt` is clamped up to `createdAt`.
//! - Order of the kept entries is preserved exactly.

use crate::model::note::{ImageRef, Note, NoteDraft, NoteId};
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Failure translating between notes and their stored JSON form.
#[derive(Debug)]
pub enum CodecError {
    Json(serde_json::Error),
    Entry {
        index: usize,
        source: serde_json::Error,
    },
    Timestamp {
        note_id: String,
        field: &'static str,
        value: String,
        source: chrono::ParseError,
    },
    TimestampOrder(String),
    DuplicateId(String),
}

impl Display for CodecError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json(err) => write!(f, "invalid notes payload: {err}"),
            Self::Entry { index, source } => write!(f, "invalid note entry #{index}: {source}"),
            Self::Timestamp {
                note_id,
                field,
                value,
                source,
            } => write!(
                f,
                "invalid `{field}` value `{value}` on note {note_id}: {source}"
            ),
            Self::TimestampOrder(note_id) => {
                write!(f, "note {note_id} has createdAt later than updatedAt")
            }
            Self::DuplicateId(note_id) => write!(f, "duplicate note id {note_id}"),
        }
    }
}

impl Error for CodecError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Json(err) => Some(err),
            Self::Entry { source, .. } => Some(source),
            Self::Timestamp { source, .. } => Some(source),
            Self::TimestampOrder(_) | Self::DuplicateId(_) => None,
        }
    }
}

impl From<serde_json::Error> for CodecError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredNote {
    id: String,
    title: String,
    content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    image_uri: Option<String>,
    created_at: String,
    updated_at: String,
}

impl From<&Note> for StoredNote {
    fn from(note: &Note) -> Self {
        Self {
            id: note.id().as_str().to_string(),
            title: note.title().to_string(),
            content: note.content().to_string(),
            image_uri: note.image_uri().map(|image| image.as_str().to_string()),
            created_at: format_timestamp(note.created_at()),
            updated_at: format_timestamp(note.updated_at()),
        }
    }
}

impl StoredNote {
    /// Converts to a note; `true` when `updatedAt` had to be clamped.
    fn into_note(self) -> Result<(Note, bool), CodecError> {
        let created_at = parse_field(&self.id, "createdAt", &self.created_at)?;
        let parsed_updated_at = parse_field(&self.id, "updatedAt", &self.updated_at)?;
        let clamped = parsed_updated_at < created_at;
        let updated_at = parsed_updated_at.max(created_at);

        let draft = NoteDraft {
            title: self.title,
            content: self.content,
            // An empty reference never pointed at an image.
            image_uri: self
                .image_uri
                .filter(|value| !value.is_empty())
                .map(ImageRef::from),
        };
        let note = Note::restore(NoteId::from(self.id), draft, created_at, updated_at);
        Ok((note, clamped))
    }
}

/// Notes recovered from a payload, plus every entry-level problem found.
#[derive(Debug, Default)]
pub struct DecodedNotes {
    pub notes: Vec<Note>,
    /// `TimestampOrder` issues were repaired and kept; all others were dropped.
    pub issues: Vec<CodecError>,
}

/// Serializes the full collection as one JSON array.
pub fn encode_notes(notes: &[Note]) -> Result<String, CodecError> {
    let stored: Vec<StoredNote> = notes.iter().map(StoredNote::from).collect();
    Ok(serde_json::to_string(&stored)?)
}

/// Parses a persisted JSON array back into notes, keeping order.
///
/// # Errors
/// - `CodecError::Json` when `raw` is not a JSON array. Bad entries inside a
///   valid array are reported through `DecodedNotes::issues` instead.
pub fn decode_notes(raw: &str) -> Result<DecodedNotes, CodecError> {
    let entries: Vec<serde_json::Value> = serde_json::from_str(raw)?;
    let mut seen = HashSet::with_capacity(entries.len());
    let mut decoded = DecodedNotes {
        notes: Vec::with_capacity(entries.len()),
        issues: Vec::new(),
    };

    for (index, entry) in entries.into_iter().enumerate() {
        let stored: StoredNote = match serde_json::from_value(entry) {
            Ok(stored) => stored,
            Err(source) => {
                decoded.issues.push(CodecError::Entry { index, source });
                continue;
            }
        };
        if seen.contains(&stored.id) {
            decoded.issues.push(CodecError::DuplicateId(stored.id));
            continue;
        }

        match stored.into_note() {
            Ok((note, clamped)) => {
                if clamped {
                    decoded
                        .issues
                        .push(CodecError::TimestampOrder(note.id().to_string()));
                }
                seen.insert(note.id().to_string());
                decoded.notes.push(note);
            }
            Err(err) => decoded.issues.push(err),
        }
    }

    Ok(decoded)
}

/// Formats a timestamp as `YYYY-MM-DDTHH:MM:SS.mmmZ`.
pub fn format_timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parses an RFC 3339 timestamp (any offset) into UTC at millisecond precision.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(value.trim())
        .map(|parsed| parsed.with_timezone(&Utc).trunc_subsecs(3))
}

fn parse_field(
    note_id: &str,
    field: &'static str,
    value: &str,
) -> Result<DateTime<Utc>, CodecError> {
    parse_timestamp(value).map_err(|source| CodecError::Timestamp {
        note_id: note_id.to_string(),
        field,
        value: value.to_string(),
        source,
    })
}
