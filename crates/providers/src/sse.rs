//! Server-sent events for streamed assistant runs.
//!
//! [`SseDecoder`] turns raw response bytes into `event:`/`data:` frames.
//! [`to_run_event`] maps a frame onto the domain [`RunEvent`]; events this
//! crate does not care about (run steps, status changes) map to `None`.

use serde::Deserialize;
use studymate_core::citation::Annotation;
use studymate_core::stream::{CompletedMessage, RunEvent};

/// A single dispatched SSE frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseFrame {
    pub event: Option<String>,
    pub data: String,
}

impl SseFrame {
    /// The provider's end-of-stream sentinel.
    pub fn is_done(&self) -> bool {
        self.event.as_deref() == Some("done") || self.data.trim() == "[DONE]"
    }
}

/// Incremental SSE decoder.
///
/// Bytes are buffered until a full line is available, so multi-byte UTF-8
/// sequences split across network chunks decode correctly.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    event: Option<String>,
    data: Vec<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk of bytes and collect every frame it completes.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<SseFrame> {
        self.buffer.extend_from_slice(bytes);

        let mut frames = Vec::new();
        while let Some(line_end) = self.buffer.iter().position(|b| *b == b'\n') {
            let raw: Vec<u8> = self.buffer.drain(..=line_end).collect();
            let line = String::from_utf8_lossy(&raw[..line_end]);
            let line = line.trim_end_matches('\r');
            if let Some(frame) = self.process_line(line) {
                frames.push(frame);
            }
        }
        frames
    }

    /// Flush whatever is left once the byte stream has ended.
    pub fn finish(&mut self) -> Option<SseFrame> {
        if !self.buffer.is_empty() {
            let raw = std::mem::take(&mut self.buffer);
            let line = String::from_utf8_lossy(&raw);
            if let Some(frame) = self.process_line(line.trim_end_matches('\r')) {
                return Some(frame);
            }
        }
        self.take_frame()
    }

    fn process_line(&mut self, line: &str) -> Option<SseFrame> {
        // Blank line dispatches the pending frame
        if line.is_empty() {
            return self.take_frame();
        }

        // Comment / keep-alive
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "event" => self.event = Some(value.to_string()),
            "data" => self.data.push(value.to_string()),
            _ => {}
        }
        None
    }

    fn take_frame(&mut self) -> Option<SseFrame> {
        if self.event.is_none() && self.data.is_empty() {
            return None;
        }
        let frame = SseFrame {
            event: self.event.take(),
            data: self.data.join("\n"),
        };
        self.data.clear();
        Some(frame)
    }
}

/// Map a frame onto a domain event.
///
/// Returns `Ok(None)` for events that carry nothing the session needs.
pub fn to_run_event(frame: &SseFrame) -> Result<Option<RunEvent>, serde_json::Error> {
    let event = match frame.event.as_deref() {
        Some(event) => event,
        None => return Ok(None),
    };

    match event {
        "thread.message.delta" => {
            let delta: ApiMessageDelta = serde_json::from_str(&frame.data)?;
            let value: String = delta
                .delta
                .content
                .into_iter()
                .filter_map(|part| match part {
                    ApiContentPart::Text { text } => Some(text.value),
                    ApiContentPart::Other => None,
                })
                .collect();
            if value.is_empty() {
                Ok(None)
            } else {
                Ok(Some(RunEvent::TextDelta { value }))
            }
        }
        "thread.message.completed" => {
            let message: ApiThreadMessage = serde_json::from_str(&frame.data)?;
            Ok(Some(RunEvent::MessageDone {
                message: message.into_completed(),
            }))
        }
        "thread.run.completed" => Ok(Some(RunEvent::RunCompleted)),
        "thread.run.failed" | "thread.run.cancelled" | "thread.run.expired"
        | "thread.run.incomplete" => {
            let run: ApiRun = serde_json::from_str(&frame.data)?;
            Ok(Some(RunEvent::RunFailed {
                reason: run.failure_reason(),
            }))
        }
        "error" => {
            let value: serde_json::Value =
                serde_json::from_str(&frame.data).unwrap_or(serde_json::Value::Null);
            let reason = value["message"]
                .as_str()
                .or_else(|| value["error"]["message"].as_str())
                .map(String::from)
                .unwrap_or_else(|| frame.data.clone());
            Ok(Some(RunEvent::RunFailed { reason }))
        }
        _ => Ok(None),
    }
}

// --- Assistants stream payloads (internal) ---

#[derive(Debug, Deserialize)]
struct ApiMessageDelta {
    delta: ApiDeltaBody,
}

#[derive(Debug, Deserialize)]
struct ApiDeltaBody {
    #[serde(default)]
    content: Vec<ApiContentPart>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ApiContentPart {
    Text { text: ApiText },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct ApiText {
    #[serde(default)]
    value: String,
    #[serde(default)]
    annotations: Vec<ApiAnnotation>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ApiAnnotation {
    FileCitation {
        #[serde(default)]
        text: String,
        #[serde(default)]
        start_index: Option<usize>,
        #[serde(default)]
        end_index: Option<usize>,
        file_citation: ApiFileRef,
    },
    FilePath {
        #[serde(default)]
        text: String,
        #[serde(default)]
        start_index: Option<usize>,
        #[serde(default)]
        end_index: Option<usize>,
        file_path: ApiFileRef,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct ApiFileRef {
    file_id: String,
    #[serde(default)]
    quote: Option<String>,
}

impl ApiAnnotation {
    fn into_domain(self) -> Option<Annotation> {
        match self {
            Self::FileCitation {
                text,
                start_index,
                end_index,
                file_citation,
            } => Some(Annotation::FileCitation {
                text,
                file_id: file_citation.file_id,
                quote: file_citation.quote,
                start_index,
                end_index,
            }),
            Self::FilePath {
                text,
                start_index,
                end_index,
                file_path,
            } => Some(Annotation::FilePath {
                text,
                file_id: file_path.file_id,
                start_index,
                end_index,
            }),
            Self::Other => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiThreadMessage {
    id: String,
    #[serde(default)]
    content: Vec<ApiContentPart>,
}

impl ApiThreadMessage {
    fn into_completed(self) -> CompletedMessage {
        let mut text = String::new();
        let mut annotations = Vec::new();
        for part in self.content {
            if let ApiContentPart::Text { text: part } = part {
                text.push_str(&part.value);
                annotations.extend(
                    part.annotations
                        .into_iter()
                        .filter_map(ApiAnnotation::into_domain),
                );
            }
        }
        CompletedMessage {
            id: self.id,
            text,
            annotations,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiRun {
    #[serde(default)]
    status: String,
    #[serde(default)]
    last_error: Option<ApiRunError>,
}

#[derive(Debug, Deserialize)]
struct ApiRunError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

impl ApiRun {
    fn failure_reason(&self) -> String {
        match &self.last_error {
            Some(err) if !err.message.is_empty() => format!("{}: {}", err.code, err.message),
            _ => format!("run ended with status '{}'", self.status),
        }
    }
}
