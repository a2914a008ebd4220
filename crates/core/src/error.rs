//! Error types for the studymate domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum; `Error` aggregates them.

use std::path::PathBuf;
use thiserror::Error;

/// The top-level error type for all studymate operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Preconditions (missing file / env / id) ---
    #[error("Precondition failed: {0}")]
    Precondition(#[from] PreconditionError),

    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Notes schema ---
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    // --- Local filesystem ---
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Wrap an I/O error with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// A required local input is missing. Raised before any remote call.
#[derive(Debug, Clone, Error)]
pub enum PreconditionError {
    #[error("document not found: {0}")]
    DocumentMissing(PathBuf),

    #[error("document is not a regular file: {0}")]
    NotARegularFile(PathBuf),

    #[error("no API key configured (set OPENAI_API_KEY or STUDYMATE_API_KEY)")]
    MissingApiKey,

    #[error("assistant ID file '{0}' is missing or empty; run `studymate bootstrap` first")]
    MissingAssistantId(PathBuf),
}

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError {
        status_code: u16,
        message: String,
    },

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Stream interrupted: {0}")]
    StreamInterrupted(String),

    #[error("Run failed: {0}")]
    RunFailed(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Upload failed: {0}")]
    Upload(String),
}

impl ProviderError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// The notes payload could not be trusted.
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    /// The payload is not JSON at all. Keeps the raw text for diagnostics.
    #[error("malformed payload at line {line}, column {column}: {message}")]
    MalformedPayload {
        raw: String,
        line: usize,
        column: usize,
        message: String,
    },

    /// Well-formed JSON with the wrong top-level shape.
    #[error("invalid notes payload shape: {reason}")]
    Shape { reason: String },

    /// A single note violates a field constraint.
    #[error("note #{index}: field `{field}` {constraint}")]
    Field {
        index: usize,
        field: &'static str,
        constraint: String,
    },
}

impl ValidationError {
    /// Name of the offending field, if the error is field-level.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::Field { field, .. } => Some(field),
            _ => None,
        }
    }

    /// The raw payload text, if the error is a decode failure.
    pub fn raw(&self) -> Option<&str> {
        match self {
            Self::MalformedPayload { raw, .. } => Some(raw),
            _ => None,
        }
    }
}
