//! Citations attached to assistant answers.
//!
//! An `Annotation` is exactly what the provider returned on a completed
//! message. A `Citation` is the display form, with the filename resolved
//! best-effort. Citations are never synthesized without an annotation.

use serde::{Deserialize, Serialize};

/// Filename shown when the cited file cannot be looked up.
pub const UNRESOLVED_FILENAME: &str = "<unresolved file>";

/// Provider-supplied metadata linking a span of answer text to a source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Annotation {
    /// Direct citation of a retrieved file, optionally with a quoted excerpt.
    FileCitation {
        text: String,
        file_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        quote: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        start_index: Option<usize>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        end_index: Option<usize>,
    },
    /// Reference to a file path; never carries a quote.
    FilePath {
        text: String,
        file_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        start_index: Option<usize>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        end_index: Option<usize>,
    },
}

impl Annotation {
    pub fn file_id(&self) -> &str {
        match self {
            Self::FileCitation { file_id, .. } | Self::FilePath { file_id, .. } => file_id,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Self::FileCitation { text, .. } | Self::FilePath { text, .. } => text,
        }
    }

    pub fn quote(&self) -> Option<&str> {
        match self {
            Self::FileCitation { quote, .. } => quote.as_deref().filter(|q| !q.is_empty()),
            Self::FilePath { .. } => None,
        }
    }

    fn span(&self) -> Option<(usize, usize)> {
        let (start, end) = match self {
            Self::FileCitation {
                start_index,
                end_index,
                ..
            }
            | Self::FilePath {
                start_index,
                end_index,
                ..
            } => (start_index, end_index),
        };
        start.zip(*end)
    }
}

/// A citation ready for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub file_id: String,
    /// Resolved filename, or [`UNRESOLVED_FILENAME`].
    pub filename: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quote: Option<String>,
    /// The span of assistant text this citation annotates.
    pub cited_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub span: Option<(usize, usize)>,
}

impl Citation {
    pub fn from_annotation(annotation: &Annotation, filename: Option<String>) -> Self {
        Self {
            file_id: annotation.file_id().to_string(),
            filename: filename.unwrap_or_else(|| UNRESOLVED_FILENAME.to_string()),
            quote: annotation.quote().map(str::to_string),
            cited_text: annotation.text().to_string(),
            span: annotation.span(),
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.filename != UNRESOLVED_FILENAME
    }
}

/// True iff at least one citation carries a source-file identifier.
pub fn self_check(citations: &[Citation]) -> bool {
    citations.iter().any(|c| !c.file_id.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_provider_annotations() {
        let json = r#"[
            {"type":"file_citation","text":"【4:0†source】","start_index":10,"end_index":22,
             "file_id":"file-1","quote":"limits approach"},
            {"type":"file_path","text":"sandbox:/x.csv","file_id":"file-2"}
        ]"#;
        let annotations: Vec<Annotation> = serde_json::from_str(json).unwrap();
        assert_eq!(annotations.len(), 2);
        assert_eq!(annotations[0].quote(), Some("limits approach"));
        assert_eq!(annotations[1].quote(), None);
        assert_eq!(annotations[1].file_id(), "file-2");
    }

    #[test]
    fn unresolved_filename_uses_placeholder() {
        let annotation = Annotation::FilePath {
            text: "ref".into(),
            file_id: "file-9".into(),
            start_index: None,
            end_index: None,
        };
        let citation = Citation::from_annotation(&annotation, None);
        assert_eq!(citation.filename, UNRESOLVED_FILENAME);
        assert!(!citation.is_resolved());
        assert_eq!(citation.cited_text, "ref");
    }

    #[test]
    fn empty_quote_is_dropped() {
        let annotation = Annotation::FileCitation {
            text: "t".into(),
            file_id: "file-1".into(),
            quote: Some(String::new()),
            start_index: Some(1),
            end_index: Some(2),
        };
        let citation = Citation::from_annotation(&annotation, Some("calc.pdf".into()));
        assert!(citation.quote.is_none());
        assert_eq!(citation.span, Some((1, 2)));
    }

    #[test]
    fn self_check_needs_a_file_id() {
        assert!(!self_check(&[]));
        let blank = Citation {
            file_id: " ".into(),
            filename: UNRESOLVED_FILENAME.into(),
            quote: None,
            cited_text: String::new(),
            span: None,
        };
        assert!(!self_check(std::slice::from_ref(&blank)));
        let real = Citation {
            file_id: "file-1".into(),
            ..blank.clone()
        };
        assert!(self_check(&[blank, real]));
    }
}
