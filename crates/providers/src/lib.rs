//! Provider implementations for studymate.
//!
//! [`OpenAiClient`] implements both `studymate_core::Provider` (chat
//! completions) and `studymate_core::AssistantsApi` (assistants, files,
//! vector stores, threads, streamed runs) over an OpenAI-compatible API.

pub mod openai;
pub mod sse;

pub use openai::OpenAiClient;
pub use sse::{SseDecoder, SseFrame};
