//! Free-text reservation notes.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::ReservationValidationError;

/// Maximum note length in Unicode scalar values, measured after trimming.
pub const NOTE_MAX_CHARS: usize = 1000;

/// Trimmed annotation attached to a reservation. May be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Note(String);

impl Note {
    /// Trim and validate a note.
    ///
    /// # Example
    ///
    /// ```
    /// # use reservations::domain::reservation::Note;
    /// let note = Note::new("  window seat  ").expect("short note");
    /// assert_eq!(note.as_str(), "window seat");
    /// assert!(Note::new("é".repeat(1001)).is_err());
    /// ```
    pub fn new(raw: impl AsRef<str>) -> Result<Self, ReservationValidationError> {
        let trimmed = raw.as_ref().trim();
        let length = trimmed.chars().count();
        if length > NOTE_MAX_CHARS {
            return Err(ReservationValidationError::NoteTooLong {
                max: NOTE_MAX_CHARS,
                actual: length,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the note text.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Whether the note carries no text.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<str> for Note {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Note> for String {
    fn from(value: Note) -> Self {
        value.0
    }
}

impl TryFrom<String> for Note {
    type Error = ReservationValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}
