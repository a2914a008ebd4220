//! Configuration loading, validation, and management for studymate.
//!
//! Loads configuration from `./studymate.toml` (or `$STUDYMATE_CONFIG`),
//! after pulling a local `.env` file into the environment, and then applies
//! environment variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use studymate_core::PreconditionError;

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "studymate.toml";

/// The root configuration structure.
///
/// Maps directly to `studymate.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Provider API key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL of the OpenAI-compatible API
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Model used for the assistant and for notes generation
    #[serde(default = "default_model")]
    pub model: String,

    /// Timeout for each non-streaming request
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// A streamed run is abandoned after this long without data
    #[serde(default = "default_stream_idle_timeout")]
    pub stream_idle_timeout_secs: u64,

    #[serde(default)]
    pub assistant: AssistantConfig,

    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub notes: NotesConfig,
}

fn default_api_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_model() -> String {
    "gpt-4o-mini".into()
}
fn default_request_timeout() -> u64 {
    120
}
fn default_stream_idle_timeout() -> u64 {
    60
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("stream_idle_timeout_secs", &self.stream_idle_timeout_secs)
            .field("assistant", &self.assistant)
            .field("paths", &self.paths)
            .field("notes", &self.notes)
            .finish()
    }
}

/// How the remote assistant is created and instructed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantConfig {
    #[serde(default = "default_assistant_name")]
    pub name: String,

    /// Standing instructions given at creation time
    #[serde(default = "default_instructions")]
    pub instructions: String,

    /// Extra instructions sent with every run
    #[serde(default = "default_run_instructions")]
    pub run_instructions: String,

    /// Name given to the knowledge store created on first ingestion
    #[serde(default = "default_store_name")]
    pub store_name: String,
}

fn default_assistant_name() -> String {
    "Study Q&A Assistant".into()
}
fn default_instructions() -> String {
    "You are a helpful tutor. Use the knowledge in the attached files to answer questions. \
     Cite sources where possible."
        .into()
}
fn default_run_instructions() -> String {
    "Please answer the user's question based on the provided documents. Cite your sources clearly."
        .into()
}
fn default_store_name() -> String {
    "Study Material".into()
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            name: default_assistant_name(),
            instructions: default_instructions(),
            run_instructions: default_run_instructions(),
            store_name: default_store_name(),
        }
    }
}

/// Local files the commands read and write. Relative paths resolve against
/// the working directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Holds the persisted assistant ID
    #[serde(default = "default_assistant_id_file")]
    pub assistant_id_file: PathBuf,

    /// Where generated notes are written and checked
    #[serde(default = "default_notes_file")]
    pub notes_file: PathBuf,

    /// Document ingested by `bootstrap` when none is given on the command line
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document: Option<PathBuf>,
}

fn default_assistant_id_file() -> PathBuf {
    PathBuf::from("assistant_id.txt")
}
fn default_notes_file() -> PathBuf {
    PathBuf::from("exam_notes.json")
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            assistant_id_file: default_assistant_id_file(),
            notes_file: default_notes_file(),
            document: None,
        }
    }
}

/// Notes generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotesConfig {
    /// Description of the study material, sent as the user message
    #[serde(default = "default_notes_context")]
    pub context: String,

    /// How many notes the model is asked for
    #[serde(default = "default_expected_count")]
    pub expected_count: usize,
}

fn default_notes_context() -> String {
    "The study material is about the basics of Calculus, including topics like limits, \
     derivatives, the definition of an integral (definite and indefinite), and fundamental \
     theorems like the Mean Value Theorem and the Fundamental Theorem of Calculus. \
     Please generate notes based on these core calculus concepts."
        .into()
}
fn default_expected_count() -> usize {
    10
}

impl Default for NotesConfig {
    fn default() -> Self {
        Self {
            context: default_notes_context(),
            expected_count: default_expected_count(),
        }
    }
}

impl AppConfig {
    /// Load configuration the way every command does.
    ///
    /// Order, lowest priority first: defaults, config file, `.env` file,
    /// process environment. Recognized variables:
    /// - `STUDYMATE_API_KEY`, then `OPENAI_API_KEY` (only when the file sets no key)
    /// - `STUDYMATE_MODEL`, `STUDYMATE_API_URL`
    /// - `STUDYMATE_ASSISTANT_ID_FILE`, `STUDYMATE_NOTES_FILE`
    pub fn load() -> Result<Self, ConfigError> {
        // Development convenience; real environment variables win.
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "Loaded environment file");
        }

        let mut config = Self::load_from(&Self::config_path())?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// The config file path: `$STUDYMATE_CONFIG` or `./studymate.toml`.
    pub fn config_path() -> PathBuf {
        std::env::var("STUDYMATE_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(CONFIG_FILE_NAME))
    }

    /// Apply overrides from an environment lookup.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if self.api_key.is_none() {
            self.api_key = non_empty("STUDYMATE_API_KEY").or_else(|| non_empty("OPENAI_API_KEY"));
        }
        if let Some(model) = non_empty("STUDYMATE_MODEL") {
            self.model = model;
        }
        if let Some(url) = non_empty("STUDYMATE_API_URL") {
            self.api_url = url;
        }
        if let Some(path) = non_empty("STUDYMATE_ASSISTANT_ID_FILE") {
            self.paths.assistant_id_file = PathBuf::from(path);
        }
        if let Some(path) = non_empty("STUDYMATE_NOTES_FILE") {
            self.paths.notes_file = PathBuf::from(path);
        }
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.model.trim().is_empty() {
            return Err(ConfigError::ValidationError("model must not be empty".into()));
        }

        if self.assistant.name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "assistant.name must not be empty".into(),
            ));
        }

        if self.request_timeout_secs == 0 || self.stream_idle_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "timeouts must be greater than zero".into(),
            ));
        }

        if !(1..=10).contains(&self.notes.expected_count) {
            return Err(ConfigError::ValidationError(
                "notes.expected_count must be between 1 and 10".into(),
            ));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// The API key, or the fatal precondition error every networked command reports.
    pub fn require_api_key(&self) -> Result<&str, PreconditionError> {
        self.api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or(PreconditionError::MissingApiKey)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: default_api_url(),
            model: default_model(),
            request_timeout_secs: default_request_timeout(),
            stream_idle_timeout_secs: default_stream_idle_timeout(),
            assistant: AssistantConfig::default(),
            paths: PathsConfig::default(),
            notes: NotesConfig::default(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
