//! Remote resource handles: assistants, knowledge stores, and ingested files.
//!
//! These are value snapshots of provider-side state. The only durable local
//! record is the persisted assistant ID; everything else is re-fetched.

use serde::{Deserialize, Serialize};

/// A capability declared on an assistant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AssistantTool {
    /// Retrieval over documents in the attached knowledge store.
    FileSearch,
    /// Anything this crate does not model. Kept so a round-trip does not drop it.
    #[serde(other)]
    Other,
}

/// External identifier and configuration of a conversational agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssistantHandle {
    /// Opaque provider ID (e.g. `asst_abc123`)
    pub id: String,

    /// Display name
    #[serde(default)]
    pub name: Option<String>,

    /// Model backing the assistant
    #[serde(default)]
    pub model: String,

    /// Declared capabilities
    #[serde(default)]
    pub tools: Vec<AssistantTool>,

    /// Knowledge stores currently attached for retrieval
    #[serde(default)]
    pub vector_store_ids: Vec<String>,
}

impl AssistantHandle {
    pub fn has_retrieval(&self) -> bool {
        self.tools.contains(&AssistantTool::FileSearch)
    }

    /// The store new documents should go into, if one is attached.
    pub fn primary_store(&self) -> Option<&str> {
        self.vector_store_ids.first().map(String::as_str)
    }

    pub fn has_store(&self, store_id: &str) -> bool {
        self.vector_store_ids.iter().any(|id| id == store_id)
    }
}

/// Parameters for creating a new assistant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantSpec {
    pub name: String,
    pub instructions: String,
    pub model: String,
    pub tools: Vec<AssistantTool>,
}

impl AssistantSpec {
    /// A spec with the retrieval capability declared.
    pub fn with_retrieval(
        name: impl Into<String>,
        instructions: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            instructions: instructions.into(),
            model: model.into(),
            tools: vec![AssistantTool::FileSearch],
        }
    }
}

/// A named container of ingested documents used for retrieval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeStore {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// A file made available for retrieval. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestedDocument {
    /// Opaque provider file ID (e.g. `file-xyz`)
    pub file_id: String,
    /// Original filename
    pub filename: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retrieval_spec_declares_file_search() {
        let spec = AssistantSpec::with_retrieval("Tutor", "Be helpful", "gpt-4o-mini");
        assert_eq!(spec.tools, vec![AssistantTool::FileSearch]);
    }

    #[test]
    fn primary_store_is_first_attached() {
        let handle = AssistantHandle {
            id: "asst_1".into(),
            name: None,
            model: "gpt-4o-mini".into(),
            tools: vec![AssistantTool::FileSearch],
            vector_store_ids: vec!["vs_a".into(), "vs_b".into()],
        };
        assert!(handle.has_retrieval());
        assert_eq!(handle.primary_store(), Some("vs_a"));
        assert!(handle.has_store("vs_b"));
        assert!(!handle.has_store("vs_c"));
    }

    #[test]
    fn unknown_tool_type_is_tolerated() {
        let data = r#"[{"type":"file_search"},{"type":"code_interpreter"}]"#;
        let tools: Vec<AssistantTool> = serde_json::from_str(data).unwrap();
        assert_eq!(tools, vec![AssistantTool::FileSearch, AssistantTool::Other]);
    }
}
