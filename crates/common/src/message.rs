//! Messages exchanged between crew stages.

use serde::{Deserialize, Serialize};

/// Role of a message sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    Agent,
}

/// Output of one agent, or a system notice emitted by a workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentMessage {
    /// Unique message ID
    pub id: String,

    pub role: MessageRole,

    /// Raw text produced by the agent (usually JSON wrapped in prose)
    pub content: String,

    /// Agent that produced the message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_agent: Option<String>,

    /// Pipeline task the message answers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,

    /// Timestamp (Unix millis)
    pub timestamp: u64,

    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub metadata: serde_json::Value,
}

impl AgentMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role: MessageRole::System,
            content: content.into(),
            source_agent: None,
            task_id: None,
            timestamp: crate::now_millis(),
            metadata: serde_json::Value::Null,
        }
    }

    pub fn from_agent(agent: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role: MessageRole::Agent,
            content: content.into(),
            source_agent: Some(agent.into()),
            task_id: None,
            timestamp: crate::now_millis(),
            metadata: serde_json::Value::Null,
        }
    }

    pub fn for_task(mut self, task_id: impl Into<String>) -> Self {
        self.task_id = Some(task_id.into());
        self
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn agent_message_records_source_and_task() {
        let msg = AgentMessage::from_agent("writer", "draft").for_task("task_1");
        assert_eq!(msg.role, MessageRole::Agent);
        assert_eq!(msg.source_agent.as_deref(), Some("writer"));
        assert_eq!(msg.task_id.as_deref(), Some("task_1"));
        assert!(msg.timestamp > 0);
    }

    #[test]
    fn null_metadata_is_not_serialized() {
        let json = serde_json::to_value(AgentMessage::system("notice")).unwrap();
        assert!(json.get("metadata").is_none());
        assert!(json.get("source_agent").is_none());
        assert_eq!(json["role"], "system");
    }
}
