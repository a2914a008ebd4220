//! OpenAI-compatible client.
//!
//! Implements both provider seams over the REST API:
//! - [`Provider`]: `/chat/completions` (non-streaming, optional JSON mode)
//! - [`AssistantsApi`]: assistants, files, vector stores, threads and
//!   streamed runs (Assistants v2)
//!
//! Every non-streaming request carries the configured request timeout. A
//! streamed run has no overall deadline but is abandoned when the provider
//! sends nothing for the idle timeout.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use studymate_config::AppConfig;
use studymate_core::assistant::{
    AssistantHandle, AssistantSpec, AssistantTool, IngestedDocument, KnowledgeStore,
};
use studymate_core::error::ProviderError;
use studymate_core::message::{Message, ThreadId};
use studymate_core::provider::*;
use tracing::{debug, trace, warn};

use crate::sse::{SseDecoder, to_run_event};

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
const DEFAULT_STREAM_IDLE_TIMEOUT: Duration = Duration::from_secs(60);

/// An OpenAI-compatible client for chat completions and the Assistants API.
pub struct OpenAiClient {
    name: String,
    base_url: String,
    api_key: String,
    client: reqwest::Client,
    request_timeout: Duration,
    stream_idle_timeout: Duration,
}

impl OpenAiClient {
    /// Create a new client against `base_url` (e.g. `https://api.openai.com/v1`).
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ProviderError::Network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            name: "openai".into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            stream_idle_timeout: DEFAULT_STREAM_IDLE_TIMEOUT,
        })
    }

    /// Create a client against the public OpenAI endpoint.
    pub fn openai(api_key: impl Into<String>) -> Result<Self, ProviderError> {
        Self::new("https://api.openai.com/v1", api_key)
    }

    /// Build a client from configuration. Fails before any request when no key is set.
    pub fn from_config(config: &AppConfig) -> studymate_core::Result<Self> {
        let api_key = config.require_api_key()?;
        let client = Self::new(&config.api_url, api_key)?.with_timeouts(
            Duration::from_secs(config.request_timeout_secs),
            Duration::from_secs(config.stream_idle_timeout_secs),
        );
        Ok(client)
    }

    pub fn with_timeouts(mut self, request: Duration, stream_idle: Duration) -> Self {
        self.request_timeout = request;
        self.stream_idle_timeout = stream_idle;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// A request with auth and the Assistants v2 header, without a deadline.
    fn base_request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, self.url(path))
            .bearer_auth(&self.api_key)
            .header("OpenAI-Beta", "assistants=v2")
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.base_request(method, path).timeout(self.request_timeout)
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        what: &str,
    ) -> Result<T, ProviderError> {
        let response = builder.send().await.map_err(map_send_error)?;
        let response = check_status(response, what).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("{what}: {e}")))
    }

    /// Convert our Message types to chat API format.
    fn to_api_messages(messages: &[Message]) -> Vec<ApiChatMessage> {
        messages
            .iter()
            .map(|m| ApiChatMessage {
                role: m.role.as_str().into(),
                content: Some(m.content.clone()),
            })
            .collect()
    }

    fn chat_body(request: &ProviderRequest) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": request.model,
            "messages": Self::to_api_messages(&request.messages),
        });

        if let Some(temperature) = request.temperature {
            body["temperature"] = serde_json::json!(temperature);
        }

        if let Some(max_tokens) = request.max_tokens {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }

        if request.response_format == ResponseFormat::JsonObject {
            body["response_format"] = serde_json::json!({ "type": "json_object" });
        }

        body
    }

    fn assistant_body(spec: &AssistantSpec) -> serde_json::Value {
        let tools: Vec<&AssistantTool> = spec
            .tools
            .iter()
            .filter(|t| **t != AssistantTool::Other)
            .collect();
        serde_json::json!({
            "name": spec.name,
            "instructions": spec.instructions,
            "model": spec.model,
            "tools": tools,
        })
    }
}

/// Map a transport failure.
fn map_send_error(e: reqwest::Error) -> ProviderError {
    if e.is_timeout() {
        ProviderError::Timeout(e.to_string())
    } else {
        ProviderError::Network(e.to_string())
    }
}

/// Turn a non-2xx response into the matching error.
async fn check_status(response: Response, what: &str) -> Result<Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let headers = response.headers().clone();
    let body = response.text().await.unwrap_or_default();
    Err(status_error(status, &headers, what, body))
}

/// The error for a failed request, from its status, headers and body.
fn status_error(
    status: StatusCode,
    headers: &HeaderMap,
    what: &str,
    body: String,
) -> ProviderError {
    match status.as_u16() {
        429 => {
            let retry_after_secs = headers
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(5);
            ProviderError::RateLimited { retry_after_secs }
        }
        401 | 403 => ProviderError::AuthenticationFailed(
            "Invalid API key or insufficient permissions".into(),
        ),
        404 => ProviderError::NotFound(format!("{what}: {body}")),
        status_code => {
            warn!(status = status_code, what, body = %body, "Provider returned error");
            ProviderError::ApiError {
                status_code,
                message: body,
            }
        }
    }
}

#[async_trait]
impl Provider for OpenAiClient {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let body = Self::chat_body(&request);

        debug!(provider = %self.name, model = %request.model, "Sending completion request");

        let api_response: ApiChatResponse = self
            .send_json(
                self.request(Method::POST, "chat/completions").json(&body),
                "chat completion",
            )
            .await?;

        let choice = api_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::InvalidResponse("No choices in response".into()))?;

        let message = Message::assistant(choice.message.content.unwrap_or_default());

        let usage = api_response.usage.map(|u| Usage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });

        Ok(ProviderResponse {
            message,
            usage,
            model: api_response.model,
        })
    }
}

#[async_trait]
impl AssistantsApi for OpenAiClient {
    async fn retrieve_assistant(
        &self,
        assistant_id: &str,
    ) -> Result<AssistantHandle, ProviderError> {
        debug!(assistant_id, "Retrieving assistant");
        let assistant: ApiAssistant = self
            .send_json(
                self.request(Method::GET, &format!("assistants/{assistant_id}")),
                "retrieve assistant",
            )
            .await?;
        Ok(assistant.into())
    }

    async fn create_assistant(
        &self,
        spec: &AssistantSpec,
    ) -> Result<AssistantHandle, ProviderError> {
        debug!(name = %spec.name, model = %spec.model, "Creating assistant");
        let assistant: ApiAssistant = self
            .send_json(
                self.request(Method::POST, "assistants")
                    .json(&Self::assistant_body(spec)),
                "create assistant",
            )
            .await?;
        Ok(assistant.into())
    }

    async fn delete_assistant(&self, assistant_id: &str) -> Result<(), ProviderError> {
        let deleted: ApiDeleted = self
            .send_json(
                self.request(Method::DELETE, &format!("assistants/{assistant_id}")),
                "delete assistant",
            )
            .await?;
        if deleted.deleted {
            Ok(())
        } else {
            Err(ProviderError::InvalidResponse(format!(
                "assistant {} was not deleted",
                deleted.id
            )))
        }
    }

    async fn attach_vector_store(
        &self,
        assistant_id: &str,
        store_id: &str,
    ) -> Result<AssistantHandle, ProviderError> {
        let body = serde_json::json!({
            "tool_resources": { "file_search": { "vector_store_ids": [store_id] } }
        });
        let assistant: ApiAssistant = self
            .send_json(
                self.request(Method::POST, &format!("assistants/{assistant_id}"))
                    .json(&body),
                "update assistant",
            )
            .await?;
        Ok(assistant.into())
    }

    async fn upload_file(&self, path: &Path) -> Result<IngestedDocument, ProviderError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| ProviderError::Upload(format!("cannot read {}: {e}", path.display())))?;
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("document")
            .to_string();

        debug!(file = %filename, bytes = bytes.len(), "Uploading file");

        let part = reqwest::multipart::Part::bytes(bytes).file_name(filename);
        let form = reqwest::multipart::Form::new()
            .text("purpose", "assistants")
            .part("file", part);

        let file: ApiFile = self
            .send_json(
                self.request(Method::POST, "files").multipart(form),
                "upload file",
            )
            .await?;
        Ok(file.into())
    }

    async fn retrieve_file(&self, file_id: &str) -> Result<IngestedDocument, ProviderError> {
        let file: ApiFile = self
            .send_json(
                self.request(Method::GET, &format!("files/{file_id}")),
                "retrieve file",
            )
            .await?;
        Ok(file.into())
    }

    async fn create_vector_store(
        &self,
        name: &str,
        file_ids: &[String],
    ) -> Result<KnowledgeStore, ProviderError> {
        let body = serde_json::json!({ "name": name, "file_ids": file_ids });
        let store: ApiVectorStore = self
            .send_json(
                self.request(Method::POST, "vector_stores").json(&body),
                "create vector store",
            )
            .await?;
        Ok(KnowledgeStore {
            id: store.id,
            name: store.name,
        })
    }

    async fn add_file_to_vector_store(
        &self,
        store_id: &str,
        file_id: &str,
    ) -> Result<(), ProviderError> {
        let body = serde_json::json!({ "file_id": file_id });
        let _: serde_json::Value = self
            .send_json(
                self.request(Method::POST, &format!("vector_stores/{store_id}/files"))
                    .json(&body),
                "add file to vector store",
            )
            .await?;
        Ok(())
    }

    async fn list_vector_store_files(&self, store_id: &str) -> Result<Vec<String>, ProviderError> {
        let list: ApiList<ApiVectorStoreFile> = self
            .send_json(
                self.request(Method::GET, &format!("vector_stores/{store_id}/files"))
                    .query(&[("limit", "100")]),
                "list vector store files",
            )
            .await?;
        Ok(list.data.into_iter().map(|f| f.id).collect())
    }

    async fn create_thread(&self) -> Result<ThreadId, ProviderError> {
        let thread: ApiObjectId = self
            .send_json(
                self.request(Method::POST, "threads")
                    .json(&serde_json::json!({})),
                "create thread",
            )
            .await?;
        Ok(ThreadId::from(thread.id))
    }

    async fn add_message(&self, thread_id: &ThreadId, content: &str) -> Result<(), ProviderError> {
        let body = serde_json::json!({ "role": "user", "content": content });
        let _: ApiObjectId = self
            .send_json(
                self.request(Method::POST, &format!("threads/{thread_id}/messages"))
                    .json(&body),
                "add message",
            )
            .await?;
        Ok(())
    }

    async fn stream_run(
        &self,
        thread_id: &ThreadId,
        assistant_id: &str,
        instructions: Option<&str>,
    ) -> Result<RunEventStream, ProviderError> {
        let mut body = serde_json::json!({
            "assistant_id": assistant_id,
            "stream": true,
        });
        if let Some(instructions) = instructions {
            body["instructions"] = serde_json::json!(instructions);
        }

        debug!(thread = %thread_id, assistant_id, "Starting streamed run");

        let send = self
            .base_request(Method::POST, &format!("threads/{thread_id}/runs"))
            .header("Accept", "text/event-stream")
            .json(&body)
            .send();
        let response = tokio::time::timeout(self.request_timeout, send)
            .await
            .map_err(|_| ProviderError::Timeout("no response to run request".into()))?
            .map_err(map_send_error)?;
        let response = check_status(response, "create run").await?;

        let (tx, rx) = tokio::sync::mpsc::channel(64);
        let idle = self.stream_idle_timeout;

        // Spawn task to read the SSE byte stream and parse events
        tokio::spawn(async move {
            let mut byte_stream = response.bytes_stream();
            let mut decoder = SseDecoder::new();

            loop {
                let next = match tokio::time::timeout(idle, byte_stream.next()).await {
                    Ok(next) => next,
                    Err(_) => {
                        let _ = tx
                            .send(Err(ProviderError::Timeout(format!(
                                "no stream data for {}s",
                                idle.as_secs()
                            ))))
                            .await;
                        return;
                    }
                };

                let ended = next.is_none();
                let frames = match next {
                    Some(Ok(bytes)) => decoder.push(&bytes),
                    Some(Err(e)) => {
                        let _ = tx
                            .send(Err(ProviderError::StreamInterrupted(e.to_string())))
                            .await;
                        return;
                    }
                    None => decoder.finish().into_iter().collect(),
                };

                for frame in frames {
                    if frame.is_done() {
                        return;
                    }
                    match to_run_event(&frame) {
                        Ok(Some(event)) => {
                            let terminal = event.is_terminal();
                            if tx.send(Ok(event)).await.is_err() {
                                return; // receiver dropped
                            }
                            if terminal {
                                return;
                            }
                        }
                        Ok(None) => {}
                        Err(e) => {
                            trace!(
                                event = ?frame.event,
                                data = %frame.data,
                                error = %e,
                                "Ignoring unparseable SSE frame"
                            );
                        }
                    }
                }

                if ended {
                    let _ = tx
                        .send(Err(ProviderError::StreamInterrupted(
                            "stream ended before the run completed".into(),
                        )))
                        .await;
                    return;
                }
            }
        });

        Ok(rx)
    }
}

// --- OpenAI API types (internal) ---

#[derive(Debug, Serialize, Deserialize)]
struct ApiChatMessage {
    role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiChatResponse {
    #[serde(default)]
    model: String,
    choices: Vec<ApiChoice>,
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiChatMessage,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ApiAssistant {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    model: String,
    #[serde(default)]
    tools: Vec<AssistantTool>,
    #[serde(default)]
    tool_resources: Option<ApiToolResources>,
}

#[derive(Debug, Deserialize)]
struct ApiToolResources {
    #[serde(default)]
    file_search: Option<ApiFileSearchResources>,
}

#[derive(Debug, Deserialize)]
struct ApiFileSearchResources {
    #[serde(default)]
    vector_store_ids: Vec<String>,
}

impl From<ApiAssistant> for AssistantHandle {
    fn from(a: ApiAssistant) -> Self {
        let vector_store_ids = a
            .tool_resources
            .and_then(|r| r.file_search)
            .map(|fs| fs.vector_store_ids)
            .unwrap_or_default();
        Self {
            id: a.id,
            name: a.name,
            model: a.model,
            tools: a.tools,
            vector_store_ids,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiDeleted {
    id: String,
    #[serde(default)]
    deleted: bool,
}

#[derive(Debug, Deserialize)]
struct ApiFile {
    id: String,
    #[serde(default)]
    filename: String,
}

impl From<ApiFile> for IngestedDocument {
    fn from(f: ApiFile) -> Self {
        Self {
            file_id: f.id,
            filename: f.filename,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiVectorStore {
    id: String,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiVectorStoreFile {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ApiList<T> {
    #[serde(default = "Vec::new")]
    data: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct ApiObjectId {
    id: String,
}
