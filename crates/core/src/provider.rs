//! Provider traits, the abstraction over the hosted AI platform.
//!
//! Two seams:
//! - [`Provider`]: one-shot chat completions (used by the notes generator).
//! - [`AssistantsApi`]: assistants, knowledge stores, files, threads and
//!   streamed runs (used by the provisioner and the Q&A session).
//!
//! Both are implemented by `studymate-providers` over HTTP and by in-memory
//! fakes in tests. Callers receive them as `Arc<dyn ...>` at construction.

use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::assistant::{AssistantHandle, AssistantSpec, IngestedDocument, KnowledgeStore};
use crate::error::ProviderError;
use crate::message::{Message, ThreadId};
use crate::stream::RunEvent;

/// How the model should shape its reply.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseFormat {
    #[default]
    Text,
    /// The reply must be a single JSON object.
    JsonObject,
}

/// A chat completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderRequest {
    /// The model to use (e.g., "gpt-4o-mini")
    pub model: String,

    /// The conversation messages
    pub messages: Vec<Message>,

    /// Temperature; provider default when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    #[serde(default)]
    pub response_format: ResponseFormat,
}

impl ProviderRequest {
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            temperature: None,
            max_tokens: None,
            response_format: ResponseFormat::Text,
        }
    }

    pub fn json_object(mut self) -> Self {
        self.response_format = ResponseFormat::JsonObject;
        self
    }
}

/// A complete (non-streaming) response from a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderResponse {
    /// The generated message
    pub message: Message,

    /// Token usage statistics
    pub usage: Option<Usage>,

    /// Which model actually responded (may differ from requested)
    pub model: String,
}

/// Token usage information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Receiver side of a streamed run.
pub type RunEventStream = mpsc::Receiver<Result<RunEvent, ProviderError>>;

/// One-shot chat completion backend.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider (e.g., "openai").
    fn name(&self) -> &str;

    /// Send a request and get a complete response.
    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError>;
}

/// Remote assistant resources, threads and runs.
///
/// Every call is a single outstanding request; callers await each before
/// issuing the next.
#[async_trait]
pub trait AssistantsApi: Send + Sync {
    /// Fetch an assistant. `ProviderError::NotFound` when the ID is stale.
    async fn retrieve_assistant(&self, assistant_id: &str)
    -> Result<AssistantHandle, ProviderError>;

    async fn create_assistant(&self, spec: &AssistantSpec)
    -> Result<AssistantHandle, ProviderError>;

    async fn delete_assistant(&self, assistant_id: &str) -> Result<(), ProviderError>;

    /// Make `store_id` the assistant's retrieval store. Returns the updated handle.
    async fn attach_vector_store(
        &self,
        assistant_id: &str,
        store_id: &str,
    ) -> Result<AssistantHandle, ProviderError>;

    /// Upload a local document for retrieval.
    async fn upload_file(&self, path: &Path) -> Result<IngestedDocument, ProviderError>;

    /// Look up file metadata (used to resolve citation filenames).
    async fn retrieve_file(&self, file_id: &str) -> Result<IngestedDocument, ProviderError>;

    /// Create a knowledge store seeded with the given files.
    async fn create_vector_store(
        &self,
        name: &str,
        file_ids: &[String],
    ) -> Result<KnowledgeStore, ProviderError>;

    async fn add_file_to_vector_store(&self, store_id: &str, file_id: &str)
    -> Result<(), ProviderError>;

    /// File IDs currently in a knowledge store.
    async fn list_vector_store_files(&self, store_id: &str) -> Result<Vec<String>, ProviderError>;

    async fn create_thread(&self) -> Result<ThreadId, ProviderError>;

    /// Append a user message to a thread.
    async fn add_message(&self, thread_id: &ThreadId, content: &str) -> Result<(), ProviderError>;

    /// Start a run on the thread and stream its events.
    ///
    /// The channel closes after a terminal event or an error.
    async fn stream_run(
        &self,
        thread_id: &ThreadId,
        assistant_id: &str,
        instructions: Option<&str>,
    ) -> Result<RunEventStream, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_request_defaults() {
        let req = ProviderRequest::new("gpt-4o-mini", vec![Message::user("hi")]);
        assert_eq!(req.response_format, ResponseFormat::Text);
        assert!(req.temperature.is_none());
        assert_eq!(
            req.json_object().response_format,
            ResponseFormat::JsonObject
        );
    }

    #[test]
    fn response_format_serialization() {
        let json = serde_json::to_string(&ResponseFormat::JsonObject).unwrap();
        assert_eq!(json, "\"json_object\"");
    }
}
