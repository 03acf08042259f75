//! Daily note model.
//!
//! # Invariants
//! - At most one note per calendar day; each save overwrites.
//! - Stored notes never exceed [`NOTE_MAX_CHARS`] Unicode scalar values.

use crate::model::date::DateKey;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Maximum note length in characters.
pub const NOTE_MAX_CHARS: usize = 140;

/// Date to note text mapping, ordered by date.
pub type DailyNotes = BTreeMap<DateKey, String>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteError {
    TooLong { chars: usize, max: usize },
}

impl Display for NoteError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TooLong { chars, max } => {
                write!(f, "note has {chars} characters; maximum is {max}")
            }
        }
    }
}

impl Error for NoteError {}

/// Rejects notes longer than [`NOTE_MAX_CHARS`].
pub fn validate_note(text: &str) -> Result<(), NoteError> {
    let chars = text.chars().count();
    if chars > NOTE_MAX_CHARS {
        return Err(NoteError::TooLong {
            chars,
            max: NOTE_MAX_CHARS,
        });
    }
    Ok(())
}

/// Truncates raw input-field text to [`NOTE_MAX_CHARS`].
pub fn clamp_note_input(text: &str) -> String {
    text.chars().take(NOTE_MAX_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::{clamp_note_input, validate_note, NoteError, NOTE_MAX_CHARS};

    #[test]
    fn limit_counts_characters_not_bytes() {
        let korean = "가".repeat(NOTE_MAX_CHARS);
        assert!(korean.len() > NOTE_MAX_CHARS);
        assert!(validate_note(&korean).is_ok());
    }

    #[test]
    fn one_over_limit_is_rejected() {
        let text = "a".repeat(NOTE_MAX_CHARS + 1);
        assert_eq!(
            validate_note(&text),
            Err(NoteError::TooLong {
                chars: 141,
                max: 140
            })
        );
        assert_eq!(clamp_note_input(&text).chars().count(), NOTE_MAX_CHARS);
    }
}
