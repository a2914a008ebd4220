//! Shared test helpers: an in-memory assistants backend.

use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::Mutex;

use studymate_core::assistant::{AssistantHandle, AssistantSpec, IngestedDocument, KnowledgeStore};
use studymate_core::error::ProviderError;
use studymate_core::message::ThreadId;
use studymate_core::provider::{AssistantsApi, RunEventStream};
use studymate_core::stream::RunEvent;

#[derive(Default)]
struct FakeState {
    next_id: usize,
    assistants: HashMap<String, AssistantHandle>,
    stores: HashMap<String, Vec<String>>,
    files: HashMap<String, String>,
    threads: HashMap<String, Vec<String>>,
    runs: VecDeque<Vec<Result<RunEvent, ProviderError>>>,
    assistant_creates: usize,
    store_creates: usize,
    uploads: usize,
    fail_create: bool,
    fail_add_to_store: bool,
    fail_delete: bool,
    fail_retrieve: bool,
    attach_does_not_stick: bool,
    unresolvable_files: bool,
}

impl FakeState {
    fn next(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}_{}", self.next_id)
    }
}

/// An in-memory `AssistantsApi` that records what was created.
///
/// Runs are scripted: each `stream_run` call replays the next queued event list.
#[derive(Default)]
pub struct FakeAssistants {
    state: Mutex<FakeState>,
}

impl FakeAssistants {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-register an assistant, as if created by an earlier run.
    pub fn with_assistant(self, id: &str) -> Self {
        self.state.lock().unwrap().assistants.insert(
            id.to_string(),
            AssistantHandle {
                id: id.to_string(),
                name: Some("Study Q&A Assistant".into()),
                model: "gpt-4o-mini".into(),
                tools: vec![studymate_core::AssistantTool::FileSearch],
                vector_store_ids: vec![],
            },
        );
        self
    }

    pub fn with_file(self, file_id: &str, filename: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .files
            .insert(file_id.to_string(), filename.to_string());
        self
    }

    /// Queue the events the next run will emit.
    pub fn with_run(self, events: Vec<Result<RunEvent, ProviderError>>) -> Self {
        self.state.lock().unwrap().runs.push_back(events);
        self
    }

    pub fn failing_create(self) -> Self {
        self.state.lock().unwrap().fail_create = true;
        self
    }

    /// Make store appends fail from now on, on an already shared fake.
    pub fn set_fail_add_to_store(&self) {
        self.state.lock().unwrap().fail_add_to_store = true;
    }

    pub fn failing_delete(self) -> Self {
        self.state.lock().unwrap().fail_delete = true;
        self
    }

    /// Every assistant lookup fails, as if the platform were unreachable.
    pub fn failing_refetch(self) -> Self {
        self.state.lock().unwrap().fail_retrieve = true;
        self
    }

    /// Attaching reports success but the assistant keeps no store.
    pub fn attach_does_not_stick(self) -> Self {
        self.state.lock().unwrap().attach_does_not_stick = true;
        self
    }

    pub fn unresolvable_files(self) -> Self {
        self.state.lock().unwrap().unresolvable_files = true;
        self
    }

    pub fn assistant_creates(&self) -> usize {
        self.state.lock().unwrap().assistant_creates
    }

    pub fn store_creates(&self) -> usize {
        self.state.lock().unwrap().store_creates
    }

    pub fn uploads(&self) -> usize {
        self.state.lock().unwrap().uploads
    }

    pub fn assistant_exists(&self, id: &str) -> bool {
        self.state.lock().unwrap().assistants.contains_key(id)
    }

    pub fn store_files(&self, store_id: &str) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .stores
            .get(store_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn thread_messages(&self, thread_id: &str) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .threads
            .get(thread_id)
            .cloned()
            .unwrap_or_default()
    }
}

fn not_found(what: &str, id: &str) -> ProviderError {
    ProviderError::NotFound(format!("{what} {id}"))
}

#[async_trait::async_trait]
impl AssistantsApi for FakeAssistants {
    async fn retrieve_assistant(
        &self,
        assistant_id: &str,
    ) -> Result<AssistantHandle, ProviderError> {
        let state = self.state.lock().unwrap();
        if state.fail_retrieve {
            return Err(ProviderError::Network("connection reset".into()));
        }
        state
            .assistants
            .get(assistant_id)
            .cloned()
            .ok_or_else(|| not_found("assistant", assistant_id))
    }

    async fn create_assistant(
        &self,
        spec: &AssistantSpec,
    ) -> Result<AssistantHandle, ProviderError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_create {
            return Err(ProviderError::Network("connection refused".into()));
        }
        let id = state.next("asst");
        let handle = AssistantHandle {
            id: id.clone(),
            name: Some(spec.name.clone()),
            model: spec.model.clone(),
            tools: spec.tools.clone(),
            vector_store_ids: vec![],
        };
        state.assistants.insert(id, handle.clone());
        state.assistant_creates += 1;
        Ok(handle)
    }

    async fn delete_assistant(&self, assistant_id: &str) -> Result<(), ProviderError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_delete {
            return Err(ProviderError::Network("connection reset".into()));
        }
        state
            .assistants
            .remove(assistant_id)
            .map(|_| ())
            .ok_or_else(|| not_found("assistant", assistant_id))
    }

    async fn attach_vector_store(
        &self,
        assistant_id: &str,
        store_id: &str,
    ) -> Result<AssistantHandle, ProviderError> {
        let mut state = self.state.lock().unwrap();
        let keep = !state.attach_does_not_stick;
        let handle = state
            .assistants
            .get_mut(assistant_id)
            .ok_or_else(|| not_found("assistant", assistant_id))?;
        let mut updated = handle.clone();
        updated.vector_store_ids = vec![store_id.to_string()];
        if keep {
            *handle = updated.clone();
        }
        Ok(updated)
    }

    async fn upload_file(&self, path: &Path) -> Result<IngestedDocument, ProviderError> {
        let mut state = self.state.lock().unwrap();
        let file_id = state.next("file");
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("document")
            .to_string();
        state.files.insert(file_id.clone(), filename.clone());
        state.uploads += 1;
        Ok(IngestedDocument { file_id, filename })
    }

    async fn retrieve_file(&self, file_id: &str) -> Result<IngestedDocument, ProviderError> {
        let state = self.state.lock().unwrap();
        if state.unresolvable_files {
            return Err(ProviderError::Network("timeout".into()));
        }
        state
            .files
            .get(file_id)
            .map(|filename| IngestedDocument {
                file_id: file_id.to_string(),
                filename: filename.clone(),
            })
            .ok_or_else(|| not_found("file", file_id))
    }

    async fn create_vector_store(
        &self,
        name: &str,
        file_ids: &[String],
    ) -> Result<KnowledgeStore, ProviderError> {
        let mut state = self.state.lock().unwrap();
        let id = state.next("vs");
        state.stores.insert(id.clone(), file_ids.to_vec());
        state.store_creates += 1;
        Ok(KnowledgeStore {
            id,
            name: Some(name.to_string()),
        })
    }

    async fn add_file_to_vector_store(
        &self,
        store_id: &str,
        file_id: &str,
    ) -> Result<(), ProviderError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_add_to_store {
            return Err(ProviderError::ApiError {
                status_code: 500,
                message: "internal error".into(),
            });
        }
        let files = state
            .stores
            .get_mut(store_id)
            .ok_or_else(|| not_found("vector store", store_id))?;
        files.push(file_id.to_string());
        Ok(())
    }

    async fn list_vector_store_files(&self, store_id: &str) -> Result<Vec<String>, ProviderError> {
        let state = self.state.lock().unwrap();
        state
            .stores
            .get(store_id)
            .cloned()
            .ok_or_else(|| not_found("vector store", store_id))
    }

    async fn create_thread(&self) -> Result<ThreadId, ProviderError> {
        let mut state = self.state.lock().unwrap();
        let id = state.next("thread");
        state.threads.insert(id.clone(), Vec::new());
        Ok(ThreadId(id))
    }

    async fn add_message(&self, thread_id: &ThreadId, content: &str) -> Result<(), ProviderError> {
        let mut state = self.state.lock().unwrap();
        state
            .threads
            .get_mut(thread_id.as_str())
            .ok_or_else(|| not_found("thread", thread_id.as_str()))?
            .push(content.to_string());
        Ok(())
    }

    async fn stream_run(
        &self,
        thread_id: &ThreadId,
        assistant_id: &str,
        _instructions: Option<&str>,
    ) -> Result<RunEventStream, ProviderError> {
        let events = {
            let mut state = self.state.lock().unwrap();
            if !state.threads.contains_key(thread_id.as_str()) {
                return Err(not_found("thread", thread_id.as_str()));
            }
            if !state.assistants.contains_key(assistant_id) {
                return Err(not_found("assistant", assistant_id));
            }
            state
                .runs
                .pop_front()
                .expect("FakeAssistants: no scripted run left")
        };

        let (tx, rx) = tokio::sync::mpsc::channel(events.len().max(1));
        for event in events {
            tx.try_send(event).expect("channel sized for all events");
        }
        Ok(rx)
    }
}
