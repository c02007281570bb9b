//! Core agent trait and configuration.
//!
//! Defined here so the agent crate and the API can share them without
//! depending on each other.

use crate::{AgentMessage, Result, Task};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Role an agent plays in the crew.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    Researcher,
    Writer,
    Editor,
    /// Coordinator in hierarchical mode
    Manager,
}

impl AgentRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentRole::Researcher => "researcher",
            AgentRole::Writer => "writer",
            AgentRole::Editor => "editor",
            AgentRole::Manager => "manager",
        }
    }
}

impl std::fmt::Display for AgentRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The trait every crew member implements.
#[async_trait]
pub trait Agent: Send + Sync {
    /// Unique identifier within a crew.
    fn id(&self) -> &str;

    /// Human-readable name.
    fn name(&self) -> &str;

    fn role(&self) -> AgentRole;

    fn config(&self) -> &AgentConfig;

    /// Process a task assigned to this agent.
    async fn process_task(&self, task: &Task) -> Result<AgentMessage>;

    /// System prompt built from the configured role, goal and backstory.
    fn system_prompt(&self) -> String {
        self.config().system_prompt()
    }
}

/// Static configuration of an agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    pub id: String,

    pub name: String,

    pub role: AgentRole,

    /// Role title as shown to the model, e.g. "Content Editor"
    pub title: String,

    pub goal: String,

    pub backstory: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    4096
}

impl AgentConfig {
    pub fn new(
        role: AgentRole,
        title: impl Into<String>,
        goal: impl Into<String>,
        backstory: impl Into<String>,
    ) -> Self {
        let title = title.into();
        Self {
            id: role.as_str().to_string(),
            name: title.clone(),
            role,
            title,
            goal: goal.into(),
            backstory: backstory.into(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn system_prompt(&self) -> String {
        format!(
            "You are {}. {}\n\nYour goal: {}",
            self.title,
            self.backstory.trim(),
            self.goal
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_id_from_role() {
        let config = AgentConfig::new(AgentRole::Editor, "Content Editor", "Polish", "Veteran.");
        assert_eq!(config.id, "editor");
        assert_eq!(config.name, "Content Editor");
        assert!((config.temperature - 0.7).abs() < f32::EPSILON);
        assert_eq!(config.max_tokens, 4096);
    }

    #[test]
    fn system_prompt_contains_goal_and_backstory() {
        let config = AgentConfig::new(
            AgentRole::Researcher,
            "Information Researcher",
            "Collect accurate facts",
            "  You have years of experience.  ",
        );
        let prompt = config.system_prompt();
        assert!(prompt.starts_with("You are Information Researcher."));
        assert!(prompt.contains("You have years of experience.\n"));
        assert!(prompt.ends_with("Your goal: Collect accurate facts"));
    }

    #[test]
    fn role_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&AgentRole::Researcher).unwrap(),
            "\"researcher\""
        );
        assert_eq!(AgentRole::Manager.to_string(), "manager");
    }
}
