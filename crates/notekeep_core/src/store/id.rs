//! Note id generation: epoch milliseconds plus a random base-36 suffix.

use crate::model::note::NoteId;
use chrono::{DateTime, Utc};
use uuid::Uuid;

const SUFFIX_LEN: usize = 7;
const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Generates an id not accepted by `is_taken`.
pub(crate) fn generate_note_id(now: DateTime<Utc>, is_taken: impl Fn(&str) -> bool) -> NoteId {
    loop {
        let candidate = format!("{}{}", now.timestamp_millis(), random_suffix());
        if !is_taken(&candidate) {
            return NoteId::from(candidate);
        }
    }
}

fn random_suffix() -> String {
    // Low bits of a v4 UUID are fully random.
    let mut entropy = Uuid::new_v4().as_u128();
    let mut suffix = String::with_capacity(SUFFIX_LEN);
    for _ in 0..SUFFIX_LEN {
        suffix.push(char::from(BASE36[(entropy % 36) as usize]));
        entropy /= 36;
    }
    suffix
}
