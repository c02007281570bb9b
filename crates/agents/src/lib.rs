//! The article crew.
//!
//! Three agents run as a pipeline, each stage feeding the next:
//!
//! - **Researcher**: searches Wikipedia and condenses what it reads into
//!   structured research
//! - **Writer**: turns the research into an article draft (JSON)
//! - **Editor**: revises the draft
//!
//! In hierarchical mode a **Manager** reviews every stage output and can
//! send it back with feedback.
//!
//! ```text
//!   topic ──▶ Researcher ──▶ Writer ──▶ Editor ──▶ Article
//!                 │             │          │
//!                 └──── Manager review (hierarchical) ────┘
//! ```

mod chat;
pub mod crew;
pub mod editing;
pub mod manager;
pub mod parsing;
pub mod research;
#[cfg(test)]
mod testing;
pub mod workflow;
pub mod writing;

pub use crew::{ArticleCrew, CrewOutput, Process};
pub use editing::EditorAgent;
pub use manager::{ManagerAgent, Review};
pub use parsing::{extract_json, parse_json};
pub use research::{ResearchResult, ResearcherAgent};
pub use wikiscribe_common::{Agent, AgentConfig, AgentRole};
pub use workflow::{
    HierarchicalWorkflow, SequentialWorkflow, Stage, StepResult, Workflow, WorkflowResult,
};
pub use writing::WriterAgent;
