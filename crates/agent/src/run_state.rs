//! Accumulation of a streamed run into a final answer.
//!
//! The run is a small state machine:
//!
//! ```text
//! Idle ──TextDelta/MessageDone──▶ Accumulating ──RunCompleted──▶ Completed
//! ```
//!
//! `RunFailed` from any state ends the run with an error. Events arriving
//! after `Completed` are ignored.

use studymate_core::error::ProviderError;
use studymate_core::provider::RunEventStream;
use studymate_core::stream::{CompletedMessage, RunEvent};
use tracing::{debug, trace};

/// Where a run is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Accumulating,
    Completed,
}

/// The final text and messages of a completed run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunOutput {
    pub text: String,
    pub messages: Vec<CompletedMessage>,
}

/// Folds run events into a [`RunOutput`].
#[derive(Debug)]
pub struct RunAccumulator {
    state: RunState,
    text: String,
    messages: Vec<CompletedMessage>,
    /// Deltas were seen for the message currently in flight
    streamed_current: bool,
}

impl Default for RunAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

impl RunAccumulator {
    pub fn new() -> Self {
        Self {
            state: RunState::Idle,
            text: String::new(),
            messages: Vec::new(),
            streamed_current: false,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Apply one event. A failed run surfaces as `RunFailed`.
    pub fn apply(&mut self, event: RunEvent) -> Result<RunState, ProviderError> {
        if self.state == RunState::Completed {
            trace!(?event, "Ignoring event after run completion");
            return Ok(self.state);
        }

        match event {
            RunEvent::TextDelta { value } => {
                self.text.push_str(&value);
                self.streamed_current = true;
                self.state = RunState::Accumulating;
            }
            RunEvent::MessageDone { message } => {
                // Messages delivered whole (no deltas) still contribute text
                if !self.streamed_current && !message.text.is_empty() {
                    if !self.text.is_empty() {
                        self.text.push_str("\n\n");
                    }
                    self.text.push_str(&message.text);
                }
                debug!(
                    message_id = %message.id,
                    annotations = message.annotations.len(),
                    "Assistant message completed"
                );
                self.messages.push(message);
                self.streamed_current = false;
                self.state = RunState::Accumulating;
            }
            RunEvent::RunCompleted => {
                self.state = RunState::Completed;
            }
            RunEvent::RunFailed { reason } => {
                return Err(ProviderError::RunFailed(reason));
            }
        }
        Ok(self.state)
    }

    /// Consume the accumulator. Only a completed run yields output.
    pub fn finish(self) -> Result<RunOutput, ProviderError> {
        if self.state != RunState::Completed {
            return Err(ProviderError::StreamInterrupted(format!(
                "run stream closed in state {:?}",
                self.state
            )));
        }
        Ok(RunOutput {
            text: self.text,
            messages: self.messages,
        })
    }
}

/// Drive a run stream to completion, reporting each text delta as it arrives.
pub async fn drive<F>(
    mut events: RunEventStream,
    mut on_delta: F,
) -> Result<RunOutput, ProviderError>
where
    F: FnMut(&str),
{
    let mut acc = RunAccumulator::new();
    while let Some(event) = events.recv().await {
        let event = event?;
        if let RunEvent::TextDelta { value } = &event {
            on_delta(value);
        }
        if acc.apply(event)? == RunState::Completed {
            break;
        }
    }
    acc.finish()
}
