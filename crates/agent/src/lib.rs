//! The assistant lifecycle for studymate.
//!
//! 1. **Provision** the remote assistant and its knowledge store
//!    (create-or-reuse, keyed by a locally persisted ID)
//! 2. **Ask** questions on a thread, streaming each run to completion
//!    and resolving the citations it returns
//! 3. **Tear down** the assistant and forget the local ID
//!
//! Everything talks to the provider through `studymate_core::AssistantsApi`,
//! so the lifecycle runs unchanged against an in-memory fake in tests.

pub mod id_store;
pub mod provisioner;
pub mod run_state;
pub mod session;
pub mod teardown;

#[cfg(test)]
mod test_helpers;

pub use id_store::AssistantIdFile;
pub use provisioner::{Provisioner, check_document};
pub use run_state::{RunAccumulator, RunOutput, RunState};
pub use session::{Answer, QUIT_TOKEN, QaSession, is_quit, resolve_citations};
pub use teardown::{TeardownReport, teardown};
