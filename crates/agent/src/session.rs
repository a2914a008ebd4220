//! Interactive question answering over the provisioned assistant.
//!
//! One thread is created per session. Each turn posts the question,
//! streams a run to completion and turns the message annotations into
//! citations.

use std::collections::HashMap;
use std::sync::Arc;

use studymate_config::AppConfig;
use studymate_core::citation::{self, Citation};
use studymate_core::error::{PreconditionError, Result};
use studymate_core::message::{ConversationThread, Message};
use studymate_core::provider::AssistantsApi;
use studymate_core::stream::CompletedMessage;
use tracing::{debug, info, warn};

use crate::id_store::AssistantIdFile;
use crate::run_state;

/// Token that ends the interactive loop (case-insensitive).
pub const QUIT_TOKEN: &str = "quit";

/// True when `line` asks to leave the loop.
pub fn is_quit(line: &str) -> bool {
    line.trim().eq_ignore_ascii_case(QUIT_TOKEN)
}

/// The outcome of one question.
#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    pub text: String,
    pub citations: Vec<Citation>,
    /// At least one citation points at a source file
    pub self_check: bool,
}

/// A conversation with the assistant on a single remote thread.
pub struct QaSession {
    api: Arc<dyn AssistantsApi>,
    assistant_id: String,
    run_instructions: Option<String>,
    thread: ConversationThread,
}

impl QaSession {
    /// Open a new thread for `assistant_id`.
    pub async fn start(
        api: Arc<dyn AssistantsApi>,
        assistant_id: impl Into<String>,
        run_instructions: Option<String>,
    ) -> Result<Self> {
        let thread_id = api.create_thread().await?;
        let assistant_id = assistant_id.into();
        info!(thread_id = %thread_id, assistant_id = %assistant_id, "Started Q&A thread");
        Ok(Self {
            api,
            assistant_id,
            run_instructions: run_instructions.filter(|s| !s.trim().is_empty()),
            thread: ConversationThread::new(thread_id),
        })
    }

    /// Start a session for the assistant persisted by an earlier bootstrap.
    pub async fn open(api: Arc<dyn AssistantsApi>, config: &AppConfig) -> Result<Self> {
        let id_file = AssistantIdFile::new(&config.paths.assistant_id_file);
        let Some(assistant_id) = id_file.read().await? else {
            return Err(PreconditionError::MissingAssistantId(id_file.path().to_path_buf()).into());
        };
        Self::start(
            api,
            assistant_id,
            Some(config.assistant.run_instructions.clone()),
        )
        .await
    }

    pub fn assistant_id(&self) -> &str {
        &self.assistant_id
    }

    pub fn thread(&self) -> &ConversationThread {
        &self.thread
    }

    /// Ask a question and wait for the complete answer.
    pub async fn ask(&mut self, question: &str) -> Result<Answer> {
        self.ask_streaming(question, |_| {}).await
    }

    /// Ask a question, reporting answer text as it streams in.
    pub async fn ask_streaming<F>(&mut self, question: &str, on_delta: F) -> Result<Answer>
    where
        F: FnMut(&str) + Send,
    {
        self.api.add_message(&self.thread.id, question).await?;
        self.thread.push(Message::user(question));

        let events = self
            .api
            .stream_run(
                &self.thread.id,
                &self.assistant_id,
                self.run_instructions.as_deref(),
            )
            .await?;
        let output = run_state::drive(events, on_delta).await?;

        let citations = resolve_citations(self.api.as_ref(), &output.messages).await;
        let self_check = citation::self_check(&citations);
        debug!(
            thread_id = %self.thread.id,
            citations = citations.len(),
            self_check,
            "Turn complete"
        );

        self.thread.push(Message::assistant(&output.text));
        Ok(Answer {
            text: output.text,
            citations,
            self_check,
        })
    }
}

/// Build citations for every annotation, looking each file up once.
///
/// A failed lookup yields the placeholder filename; it never fails the turn.
pub async fn resolve_citations(
    api: &dyn AssistantsApi,
    messages: &[CompletedMessage],
) -> Vec<Citation> {
    let mut names: HashMap<String, Option<String>> = HashMap::new();
    let mut citations = Vec::new();

    for annotation in messages.iter().flat_map(|m| m.annotations.iter()) {
        let file_id = annotation.file_id();
        if !names.contains_key(file_id) {
            let resolved = match api.retrieve_file(file_id).await {
                Ok(file) => Some(file.filename),
                Err(e) => {
                    warn!(file_id, error = %e, "Could not resolve cited file name");
                    None
                }
            };
            names.insert(file_id.to_string(), resolved);
        }
        let filename = names.get(file_id).cloned().flatten();
        citations.push(Citation::from_annotation(annotation, filename));
    }
    citations
}
