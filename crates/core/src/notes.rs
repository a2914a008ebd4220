//! Revision notes produced by the notes generator.
//!
//! The types here carry no invariants of their own. A `NotesCollection` is
//! only trustworthy after passing the schema validator in `studymate-notes`.

use serde::{Deserialize, Serialize};

/// Number of notes a collection is expected to hold.
pub const EXPECTED_NOTE_COUNT: usize = 10;

/// A single bite-sized revision note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// Position-derived ID in `1..=10`
    pub id: u32,
    pub heading: String,
    /// At most 150 characters
    pub summary: String,
    /// Page in the source document, if one can be cited
    pub page_ref: Option<u32>,
}

/// The `{"notes": [...]}` document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotesCollection {
    pub notes: Vec<Note>,
}

impl NotesCollection {
    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Note> {
        self.notes.iter()
    }

    /// Pretty JSON with two-space indentation, as written to the notes file.
    pub fn to_pretty_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl<'a> IntoIterator for &'a NotesCollection {
    type Item = &'a Note;
    type IntoIter = std::slice::Iter<'a, Note>;

    fn into_iter(self) -> Self::IntoIter {
        self.notes.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_page_ref_is_written_as_null() {
        let notes = NotesCollection {
            notes: vec![Note {
                id: 1,
                heading: "Limits".into(),
                summary: "Short intro to limits.".into(),
                page_ref: None,
            }],
        };
        let json = notes.to_pretty_json().unwrap();
        assert!(json.contains("\"page_ref\": null"));
        assert!(json.starts_with("{\n  \"notes\""));
    }
}
