//! Events delivered while a streamed assistant run is in progress.

use serde::{Deserialize, Serialize};

use crate::citation::Annotation;

/// A finished assistant message, as reported at the end of its stream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompletedMessage {
    pub id: String,
    /// Full text of the message (all text parts concatenated)
    pub text: String,
    /// Annotations across all text parts, in order
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

/// A discrete event from a streamed run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RunEvent {
    /// Partial answer text.
    TextDelta { value: String },
    /// An assistant message is complete, with its annotations.
    MessageDone { message: CompletedMessage },
    /// The run finished successfully.
    RunCompleted,
    /// The run ended without an answer (failed, cancelled, expired).
    RunFailed { reason: String },
}

impl RunEvent {
    pub fn text(value: impl Into<String>) -> Self {
        Self::TextDelta {
            value: value.into(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::RunCompleted | Self::RunFailed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_events() {
        assert!(RunEvent::RunCompleted.is_terminal());
        assert!(RunEvent::RunFailed { reason: "x".into() }.is_terminal());
        assert!(!RunEvent::text("hi").is_terminal());
    }

    #[test]
    fn event_serialization_tag() {
        let json = serde_json::to_string(&RunEvent::text("Hello")).unwrap();
        assert!(json.contains(r#""type":"text_delta""#));
        assert!(json.contains(r#""value":"Hello""#));
    }
}
