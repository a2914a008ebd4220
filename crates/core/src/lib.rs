//! # studymate Core
//!
//! Domain types, traits, and error definitions for the studymate study
//! assistant. This crate has **no HTTP dependencies**. It defines the domain
//! model that the provider client, the agent and the notes crates build on.
//!
//! Every remote capability (retrieval, generation, streaming) sits behind a
//! trait here, so the provisioning and validation logic can run against an
//! in-memory fake in tests.

pub mod assistant;
pub mod citation;
pub mod error;
pub mod message;
pub mod notes;
pub mod provider;
pub mod stream;

// Re-export key types at crate root for ergonomics
pub use assistant::{
    AssistantHandle, AssistantSpec, AssistantTool, IngestedDocument, KnowledgeStore,
};
pub use citation::{Annotation, Citation, UNRESOLVED_FILENAME};
pub use error::{Error, PreconditionError, ProviderError, Result, ValidationError};
pub use message::{ConversationThread, Message, Role, ThreadId};
pub use notes::{EXPECTED_NOTE_COUNT, Note, NotesCollection};
pub use provider::{
    AssistantsApi, Provider, ProviderRequest, ProviderResponse, ResponseFormat, RunEventStream,
    Usage,
};
pub use stream::{CompletedMessage, RunEvent};
