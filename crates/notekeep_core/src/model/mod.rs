//! Domain model for user notes.
//!
//! # Responsibility
//! - Define the canonical note record and the draft payload used to edit it.
//!
//! # Invariants
//! - Every note is identified by a stable `NoteId`.
//! - Deletion is a hard removal from the collection; there are no tombstones.

pub mod note;
