//! Notes generation behind the schema gate.
//!
//! The model is asked for a JSON object in one chat completion. Its raw
//! output goes through [`validate_with_count`]; nothing reaches disk unless it
//! passes. The notes file is written atomically (temp file, then rename).

use std::path::Path;
use std::sync::Arc;

use studymate_config::AppConfig;
use studymate_core::message::Message;
use studymate_core::notes::NotesCollection;
use studymate_core::provider::{Provider, ProviderRequest};
use tracing::{debug, info, warn};

use crate::NotesError;
use crate::schema::{MAX_SUMMARY_CHARS, ValidatedNotes, validate_with_count};

/// Produces validated revision notes from a chat completion.
pub struct NotesGenerator {
    provider: Arc<dyn Provider>,
    model: String,
    context: String,
    expected_count: usize,
}

impl NotesGenerator {
    pub fn new(
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        context: impl Into<String>,
        expected_count: usize,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            context: context.into(),
            expected_count,
        }
    }

    pub fn from_config(provider: Arc<dyn Provider>, config: &AppConfig) -> Self {
        Self::new(
            provider,
            &config.model,
            &config.notes.context,
            config.notes.expected_count,
        )
    }

    pub fn system_prompt(&self) -> String {
        let n = self.expected_count;
        format!(
            "You are a study summarizer. Your task is to extract key concepts from the provided \
             study material context. Return exactly {n} unique, bite-sized revision notes that \
             will help prepare for an exam on this material. Each note should have an 'id' from \
             1 to {n}, a 'heading', a 'summary' (max {MAX_SUMMARY_CHARS} chars), and an optional \
             'page_ref' if a specific page can be cited. Respond only with a single valid JSON \
             object that strictly matches the following schema: \
             {{\"notes\": [{{\"id\": int, \"heading\": str, \"summary\": str, \"page_ref\": int | null}}, ...]}}"
        )
    }

    pub fn request(&self) -> ProviderRequest {
        ProviderRequest::new(
            &self.model,
            vec![
                Message::system(self.system_prompt()),
                Message::user(&self.context),
            ],
        )
        .json_object()
    }

    /// Ask the model for notes and validate them. Does not write anything.
    pub async fn generate(&self) -> Result<ValidatedNotes, NotesError> {
        info!(provider = self.provider.name(), model = %self.model, "Generating exam notes");
        let response = self.provider.complete(self.request()).await?;
        if let Some(usage) = &response.usage {
            debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "Notes completion usage"
            );
        }

        let raw = response.message.content;
        if raw.trim().is_empty() {
            return Err(NotesError::EmptyResponse);
        }

        let validated = validate_with_count(&raw, self.expected_count)
            .map_err(|source| NotesError::Rejected { raw, source })?;
        for warning in &validated.warnings {
            warn!(%warning, "Generated notes diverge from the expected layout");
        }
        Ok(validated)
    }

    /// Generate, validate and persist notes to `path`.
    pub async fn generate_to(&self, path: &Path) -> Result<ValidatedNotes, NotesError> {
        let validated = self.generate().await?;
        write_notes(path, &validated.collection).await?;
        info!(path = %path.display(), notes = validated.collection.len(), "Notes saved");
        Ok(validated)
    }
}

/// Atomically write `notes` as pretty JSON with two-space indentation.
pub async fn write_notes(path: &Path, notes: &NotesCollection) -> Result<(), NotesError> {
    let mut json = notes.to_pretty_json()?;
    json.push('\n');

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| NotesError::io(parent, e))?;
    }

    let tmp_path = path.with_extension("json.tmp");
    tokio::fs::write(&tmp_path, json)
        .await
        .map_err(|e| NotesError::io(&tmp_path, e))?;
    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| NotesError::io(path, e))?;
    Ok(())
}
