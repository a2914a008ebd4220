//! Revision notes: generation and schema validation.
//!
//! The validator is the single gate for notes. It runs right after
//! generation (a rejection means nothing is written) and again on demand
//! against a file written earlier.

pub mod generator;
pub mod schema;

use std::path::{Path, PathBuf};

use studymate_core::error::{ProviderError, ValidationError};

pub use generator::{NotesGenerator, write_notes};
pub use schema::{NotesWarning, ValidatedNotes, validate, validate_file, validate_with_count};

/// Errors from the notes subsystem.
#[derive(Debug, thiserror::Error)]
pub enum NotesError {
    #[error("generated notes rejected: {source}")]
    Rejected {
        /// The model output exactly as received
        raw: String,
        #[source]
        source: ValidationError,
    },

    #[error("notes failed validation: {0}")]
    Validation(#[from] ValidationError),

    #[error("model returned an empty response")]
    EmptyResponse,

    #[error("notes file not found: {0}")]
    FileMissing(PathBuf),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not serialize notes: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl NotesError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// The raw model output, when the error came from rejecting it.
    pub fn raw(&self) -> Option<&str> {
        match self {
            Self::Rejected { raw, .. } => Some(raw),
            _ => None,
        }
    }
}
