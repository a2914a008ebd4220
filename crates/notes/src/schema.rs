//! Schema validation for the notes payload.
//!
//! Accepted shape:
//!
//! ```text
//! {"notes": [{"id": 1..=10, "heading": str(len >= 3),
//!             "summary": str(10..=150), "page_ref": int >= 1 | null}, ...]}
//! ```
//!
//! Lengths are counted in characters, not bytes. Per-note violations are
//! hard errors. The collection-level checks (note count, `id == position + 1`)
//! are advisory and come back as [`NotesWarning`]s.

use std::fmt;
use std::path::Path;

use serde_json::{Map, Value};
use studymate_core::error::ValidationError;
use studymate_core::notes::{EXPECTED_NOTE_COUNT, Note, NotesCollection};

use crate::NotesError;

pub const MIN_ID: i64 = 1;
pub const MAX_ID: i64 = 10;
pub const MIN_HEADING_CHARS: usize = 3;
pub const MIN_SUMMARY_CHARS: usize = 10;
pub const MAX_SUMMARY_CHARS: usize = 150;

/// A collection-level divergence that does not reject the payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotesWarning {
    CountMismatch { expected: usize, actual: usize },
    OutOfSequence { index: usize, expected_id: u32, actual_id: u32 },
}

impl fmt::Display for NotesWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CountMismatch { expected, actual } => {
                write!(f, "expected {expected} notes, found {actual}")
            }
            Self::OutOfSequence {
                index,
                expected_id,
                actual_id,
            } => write!(
                f,
                "note at position {index} has id {actual_id}, expected {expected_id}"
            ),
        }
    }
}

/// A payload that passed validation, with any advisory warnings.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedNotes {
    pub collection: NotesCollection,
    pub warnings: Vec<NotesWarning>,
}

impl ValidatedNotes {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Validate raw JSON text against the notes schema, expecting ten notes.
pub fn validate(raw: &str) -> Result<ValidatedNotes, ValidationError> {
    validate_with_count(raw, EXPECTED_NOTE_COUNT)
}

/// Validate raw JSON text, warning unless exactly `expected` notes are present.
pub fn validate_with_count(raw: &str, expected: usize) -> Result<ValidatedNotes, ValidationError> {
    let value: Value =
        serde_json::from_str(raw).map_err(|e| ValidationError::MalformedPayload {
            raw: raw.to_string(),
            line: e.line(),
            column: e.column(),
            message: e.to_string(),
        })?;

    let items = notes_array(&value)?;
    if items.is_empty() {
        return Err(shape("`notes` must contain at least one note"));
    }

    let notes = items
        .iter()
        .enumerate()
        .map(|(index, item)| parse_note(index, item))
        .collect::<Result<Vec<_>, _>>()?;

    let mut warnings = Vec::new();
    if notes.len() != expected {
        warnings.push(NotesWarning::CountMismatch {
            expected,
            actual: notes.len(),
        });
    }
    for (index, note) in notes.iter().enumerate() {
        let expected_id = index as u32 + 1;
        if note.id != expected_id {
            warnings.push(NotesWarning::OutOfSequence {
                index,
                expected_id,
                actual_id: note.id,
            });
        }
    }

    Ok(ValidatedNotes {
        collection: NotesCollection { notes },
        warnings,
    })
}

/// Read and validate a previously written notes file against the note
/// count it was generated for.
pub async fn validate_file(
    path: &Path,
    expected_count: usize,
) -> Result<ValidatedNotes, NotesError> {
    let raw = match tokio::fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(NotesError::FileMissing(path.to_path_buf()));
        }
        Err(e) => return Err(NotesError::io(path, e)),
    };
    Ok(validate_with_count(&raw, expected_count)?)
}

fn shape(reason: impl Into<String>) -> ValidationError {
    ValidationError::Shape {
        reason: reason.into(),
    }
}

fn field(index: usize, field: &'static str, constraint: impl Into<String>) -> ValidationError {
    ValidationError::Field {
        index,
        field,
        constraint: constraint.into(),
    }
}

fn notes_array(value: &Value) -> Result<&Vec<Value>, ValidationError> {
    let object = value
        .as_object()
        .ok_or_else(|| shape("top level must be a JSON object"))?;

    if let Some(extra) = object.keys().find(|k| k.as_str() != "notes") {
        return Err(shape(format!(
            "unexpected top-level key `{extra}`; only `notes` is allowed"
        )));
    }

    object
        .get("notes")
        .ok_or_else(|| shape("missing `notes` key"))?
        .as_array()
        .ok_or_else(|| shape("`notes` must be an array"))
}

fn parse_note(index: usize, item: &Value) -> Result<Note, ValidationError> {
    let object = item
        .as_object()
        .ok_or_else(|| shape(format!("note #{index} is not a JSON object")))?;

    let id = required(index, object, "id")?
        .as_i64()
        .ok_or_else(|| field(index, "id", "must be an integer"))?;
    if !(MIN_ID..=MAX_ID).contains(&id) {
        return Err(field(
            index,
            "id",
            format!("must be between {MIN_ID} and {MAX_ID}, got {id}"),
        ));
    }

    let heading = required_str(index, object, "heading")?;
    if heading.chars().count() < MIN_HEADING_CHARS {
        return Err(field(
            index,
            "heading",
            format!("must be at least {MIN_HEADING_CHARS} characters"),
        ));
    }

    let summary = required_str(index, object, "summary")?;
    let summary_len = summary.chars().count();
    if !(MIN_SUMMARY_CHARS..=MAX_SUMMARY_CHARS).contains(&summary_len) {
        return Err(field(
            index,
            "summary",
            format!(
                "must be {MIN_SUMMARY_CHARS} to {MAX_SUMMARY_CHARS} characters, got {summary_len}"
            ),
        ));
    }

    let page_ref = match object.get("page_ref") {
        None | Some(Value::Null) => None,
        Some(value) => {
            let page = value
                .as_i64()
                .ok_or_else(|| field(index, "page_ref", "must be an integer or null"))?;
            if page < 1 {
                return Err(field(
                    index,
                    "page_ref",
                    format!("must be a positive integer, got {page}"),
                ));
            }
            Some(u32::try_from(page).map_err(|_| field(index, "page_ref", "is too large"))?)
        }
    };

    Ok(Note {
        // range-checked above
        id: id as u32,
        heading: heading.to_string(),
        summary: summary.to_string(),
        page_ref,
    })
}

fn required<'a>(
    index: usize,
    object: &'a Map<String, Value>,
    name: &'static str,
) -> Result<&'a Value, ValidationError> {
    object
        .get(name)
        .filter(|v| !v.is_null())
        .ok_or_else(|| field(index, name, "is required"))
}

fn required_str<'a>(
    index: usize,
    object: &'a Map<String, Value>,
    name: &'static str,
) -> Result<&'a str, ValidationError> {
    required(index, object, name)?
        .as_str()
        .ok_or_else(|| field(index, name, "must be a string"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn note(id: u32) -> Value {
        json!({
            "id": id,
            "heading": format!("Concept {id}"),
            "summary": "A short summary of the concept.",
            "page_ref": null
        })
    }

    fn payload(notes: Vec<Value>) -> String {
        json!({ "notes": notes }).to_string()
    }

    fn ten_notes() -> Vec<Value> {
        (1..=10).map(note).collect()
    }

    #[test]
    fn ten_sequential_notes_pass_cleanly() {
        let validated = validate(&payload(ten_notes())).unwrap();
        assert_eq!(validated.collection.len(), 10);
        assert!(validated.is_clean());
    }

    #[test]
    fn single_note_passes_with_count_warning() {
        let raw = r#"{"notes":[{"id":1,"heading":"Limits","summary":"A limit describes approach.","page_ref":null}]}"#;
        let validated = validate(raw).unwrap();

        assert_eq!(validated.collection.len(), 1);
        assert_eq!(validated.collection.notes[0].page_ref, None);
        assert_eq!(
            validated.warnings,
            vec![NotesWarning::CountMismatch {
                expected: 10,
                actual: 1
            }]
        );
    }

    #[test]
    fn note_without_page_ref_key_warns_on_count_only() {
        let raw = r#"{"notes": [{"id":1,"heading":"Limits","summary":"Short intro to limits."}]}"#;
        let validated = validate(raw).unwrap();

        assert_eq!(validated.collection.notes[0].page_ref, None);
        assert!(matches!(
            validated.warnings.as_slice(),
            [NotesWarning::CountMismatch { actual: 1, .. }]
        ));
    }

    #[test]
    fn long_summary_is_rejected() {
        let mut notes = ten_notes();
        notes[3]["summary"] = json!("x".repeat(151));

        let err = validate(&payload(notes)).unwrap_err();

        assert_eq!(err.field(), Some("summary"));
        assert!(matches!(err, ValidationError::Field { index: 3, .. }));
    }

    #[test]
    fn summary_length_counts_characters() {
        let mut notes = ten_notes();
        // 150 multi-byte characters is still within bounds
        notes[0]["summary"] = json!("∫".repeat(150));
        assert!(validate(&payload(notes)).is_ok());
    }

    #[test]
    fn short_summary_is_rejected() {
        let mut notes = ten_notes();
        notes[0]["summary"] = json!("Too short");
        assert_eq!(
            validate(&payload(notes)).unwrap_err().field(),
            Some("summary")
        );
    }

    #[test]
    fn out_of_range_id_is_rejected() {
        let mut notes = ten_notes();
        notes[9]["id"] = json!(11);
        let err = validate(&payload(notes)).unwrap_err();
        assert_eq!(err.field(), Some("id"));

        let mut notes = ten_notes();
        notes[0]["id"] = json!(0);
        assert_eq!(validate(&payload(notes)).unwrap_err().field(), Some("id"));
    }

    #[test]
    fn non_integer_id_is_rejected() {
        let mut notes = ten_notes();
        notes[0]["id"] = json!("1");
        assert_eq!(validate(&payload(notes)).unwrap_err().field(), Some("id"));

        let mut notes = ten_notes();
        notes[0]["id"] = json!(1.5);
        assert_eq!(validate(&payload(notes)).unwrap_err().field(), Some("id"));
    }

    #[test]
    fn short_heading_is_rejected() {
        let mut notes = ten_notes();
        notes[2]["heading"] = json!("ab");
        assert_eq!(
            validate(&payload(notes)).unwrap_err().field(),
            Some("heading")
        );
    }

    #[test]
    fn missing_field_is_named() {
        let mut notes = ten_notes();
        notes[5].as_object_mut().unwrap().remove("heading");
        let err = validate(&payload(notes)).unwrap_err();
        assert_eq!(err.field(), Some("heading"));
        assert!(err.to_string().contains("is required"));
    }

    #[test]
    fn page_ref_must_be_positive() {
        let mut notes = ten_notes();
        notes[0]["page_ref"] = json!(0);
        assert_eq!(
            validate(&payload(notes)).unwrap_err().field(),
            Some("page_ref")
        );

        let mut notes = ten_notes();
        notes[0]["page_ref"] = json!(12);
        let validated = validate(&payload(notes)).unwrap();
        assert_eq!(validated.collection.notes[0].page_ref, Some(12));
    }

    #[test]
    fn absent_page_ref_is_none() {
        let mut notes = ten_notes();
        notes[0].as_object_mut().unwrap().remove("page_ref");
        let validated = validate(&payload(notes)).unwrap();
        assert_eq!(validated.collection.notes[0].page_ref, None);
    }

    #[test]
    fn out_of_sequence_ids_warn() {
        let mut notes = ten_notes();
        notes.swap(0, 1);

        let validated = validate(&payload(notes)).unwrap();

        assert_eq!(validated.warnings.len(), 2);
        assert_eq!(
            validated.warnings[0],
            NotesWarning::OutOfSequence {
                index: 0,
                expected_id: 1,
                actual_id: 2
            }
        );
    }

    #[test]
    fn malformed_json_keeps_raw_text() {
        let raw = r#"{"notes": [ {"id": 1, "#;
        let err = validate(raw).unwrap_err();

        assert_eq!(err.raw(), Some(raw));
        match err {
            ValidationError::MalformedPayload { line, column, .. } => {
                assert_eq!(line, 1);
                assert!(column > 0);
            }
            other => panic!("expected MalformedPayload, got {other:?}"),
        }
    }

    #[test]
    fn wrong_top_level_shapes_are_rejected() {
        for raw in [
            "[]",
            r#"{"items": []}"#,
            r#"{"notes": {}}"#,
            r#"{"notes": []}"#,
            r#"{"notes": [1]}"#,
        ] {
            let err = validate(raw).unwrap_err();
            assert!(
                matches!(err, ValidationError::Shape { .. }),
                "{raw} gave {err:?}"
            );
        }
    }

    #[test]
    fn extra_top_level_key_is_rejected() {
        let raw = json!({ "notes": ten_notes(), "title": "Calculus" }).to_string();
        let err = validate(&raw).unwrap_err();
        assert!(err.to_string().contains("title"));
    }

    #[test]
    fn unknown_note_fields_are_ignored() {
        let mut notes = ten_notes();
        notes[0]["difficulty"] = json!("easy");
        assert!(validate(&payload(notes)).unwrap().is_clean());
    }

    #[test]
    fn custom_expected_count() {
        let notes: Vec<_> = (1..=5).map(note).collect();
        assert!(validate_with_count(&payload(notes), 5).unwrap().is_clean());
    }

    #[tokio::test]
    async fn validate_file_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("exam_notes.json");
        let err = validate_file(&path, EXPECTED_NOTE_COUNT)
            .await
            .unwrap_err();
        assert!(matches!(err, NotesError::FileMissing(_)));
    }

    #[tokio::test]
    async fn validate_file_reads_written_notes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("exam_notes.json");
        std::fs::write(&path, payload(ten_notes())).unwrap();

        let validated = validate_file(&path, EXPECTED_NOTE_COUNT).await.unwrap();
        assert_eq!(validated.collection.len(), 10);
    }

    #[tokio::test]
    async fn validate_file_uses_configured_count() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("exam_notes.json");
        std::fs::write(&path, payload((1..=5).map(note).collect())).unwrap();

        assert!(validate_file(&path, 5).await.unwrap().is_clean());

        let strict = validate_file(&path, EXPECTED_NOTE_COUNT).await.unwrap();
        assert_eq!(
            strict.warnings,
            vec![NotesWarning::CountMismatch {
                expected: 10,
                actual: 5
            }]
        );
    }
}
