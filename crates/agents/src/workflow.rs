//! Workflow orchestration for the article crew.
//!
//! - Sequential: each stage runs once and its output becomes the next
//!   stage's context.
//! - Hierarchical: same order, but a manager reviews every output and may
//!   send a stage back with feedback a bounded number of times.
//!
//! # Example
//!
//! ```ignore
//! let workflow = SequentialWorkflow::new("article")
//!     .add_stage(researcher, research_task)
//!     .add_stage(writer, writing_task)
//!     .add_stage(editor, editing_task);
//!
//! let result = workflow.run().await?;
//! ```

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tracing::{debug, error, info, warn};
use wikiscribe_common::{Agent, AgentMessage, Result, ScribeError, Task, TaskStatus};

use crate::manager::ManagerAgent;

pub const DEFAULT_MAX_REVISIONS: u32 = 1;

/// A workflow runs its stages to completion or to the first failure.
#[async_trait]
pub trait Workflow: Send + Sync {
    async fn run(&self) -> Result<WorkflowResult>;

    fn name(&self) -> &str;
}

/// One agent and the task it is assigned.
#[derive(Clone)]
pub struct Stage {
    pub agent: Arc<dyn Agent>,
    pub task: Task,
}

#[derive(Debug, Clone)]
pub struct WorkflowResult {
    pub workflow_name: String,
    pub step_results: Vec<StepResult>,
    /// Output of the last successful stage, or the failure message
    pub final_output: AgentMessage,
    pub success: bool,
    pub duration_ms: u64,
}

#[derive(Debug, Clone)]
pub struct StepResult {
    pub agent_name: String,
    pub agent_id: String,
    pub output: AgentMessage,
    pub success: bool,
    pub duration_ms: u64,
    /// Times the manager sent this stage back
    pub revisions: u32,
}

impl WorkflowResult {
    /// Failure as an error, success as the final output.
    pub fn into_output(self) -> Result<AgentMessage> {
        if self.success {
            Ok(self.final_output)
        } else {
            Err(ScribeError::Agent(self.final_output.content))
        }
    }
}

/// The stage's task with the previous output as context.
fn prepare_task(stage: &Stage, context: Option<&str>) -> Task {
    let mut task = stage.task.clone();
    if let Some(context) = context {
        task.context = Some(context.to_string());
    }
    task.status = TaskStatus::InProgress;
    task.assigned_agent = Some(stage.agent.id().to_string());
    task
}

fn failure_message(agent_id: &str, error: &ScribeError) -> AgentMessage {
    AgentMessage::system(format!("Agent {agent_id} failed: {error}"))
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

/// Sequential workflow. Stops at the first failing stage.
pub struct SequentialWorkflow {
    name: String,
    stages: Vec<Stage>,
}

impl SequentialWorkflow {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stages: Vec::new(),
        }
    }

    pub fn add_stage(mut self, agent: Arc<dyn Agent>, task: Task) -> Self {
        self.stages.push(Stage { agent, task });
        self
    }
}

#[async_trait]
impl Workflow for SequentialWorkflow {
    async fn run(&self) -> Result<WorkflowResult> {
        let start_time = Instant::now();

        info!(
            workflow = %self.name,
            stage_count = self.stages.len(),
            "Starting sequential workflow"
        );

        if self.stages.is_empty() {
            warn!(workflow = %self.name, "Workflow has no stages");
            return Ok(WorkflowResult {
                workflow_name: self.name.clone(),
                step_results: Vec::new(),
                final_output: AgentMessage::system("Workflow has no stages"),
                success: false,
                duration_ms: elapsed_ms(start_time),
            });
        }

        let mut step_results = Vec::new();
        let mut last_output: Option<AgentMessage> = None;

        for (i, stage) in self.stages.iter().enumerate() {
            let step_start = Instant::now();
            let agent = &stage.agent;
            let task = prepare_task(stage, last_output.as_ref().map(|m| m.content.as_str()));

            info!(workflow = %self.name, step = i + 1, agent = %agent.id(), "Executing workflow step");

            match agent.process_task(&task).await {
                Ok(output) => {
                    debug!(
                        workflow = %self.name,
                        step = i + 1,
                        agent = %agent.id(),
                        output_len = output.content.len(),
                        "Step completed"
                    );
                    step_results.push(StepResult {
                        agent_name: agent.name().to_string(),
                        agent_id: agent.id().to_string(),
                        output: output.clone(),
                        success: true,
                        duration_ms: elapsed_ms(step_start),
                        revisions: 0,
                    });
                    last_output = Some(output);
                }
                Err(e) => {
                    error!(
                        workflow = %self.name,
                        step = i + 1,
                        agent = %agent.id(),
                        error = %e,
                        "Step failed"
                    );
                    let message = failure_message(agent.id(), &e);
                    step_results.push(StepResult {
                        agent_name: agent.name().to_string(),
                        agent_id: agent.id().to_string(),
                        output: message.clone(),
                        success: false,
                        duration_ms: elapsed_ms(step_start),
                        revisions: 0,
                    });
                    return Ok(WorkflowResult {
                        workflow_name: self.name.clone(),
                        step_results,
                        final_output: message,
                        success: false,
                        duration_ms: elapsed_ms(start_time),
                    });
                }
            }
        }

        info!(
            workflow = %self.name,
            steps = step_results.len(),
            duration_ms = elapsed_ms(start_time),
            "Workflow completed"
        );

        Ok(WorkflowResult {
            workflow_name: self.name.clone(),
            step_results,
            final_output: last_output
                .unwrap_or_else(|| AgentMessage::system("No output produced")),
            success: true,
            duration_ms: elapsed_ms(start_time),
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Manager-supervised workflow.
///
/// Stages run in order. After each stage the manager reviews the output
/// against the task's expected output; a rejection re-runs the stage with the
/// feedback appended to its description, at most `max_revisions` times. Once
/// the limit is reached the last output is accepted.
pub struct HierarchicalWorkflow {
    name: String,
    manager: Arc<ManagerAgent>,
    stages: Vec<Stage>,
    max_revisions: u32,
}

impl HierarchicalWorkflow {
    pub fn new(name: impl Into<String>, manager: Arc<ManagerAgent>) -> Self {
        Self {
            name: name.into(),
            manager,
            stages: Vec::new(),
            max_revisions: DEFAULT_MAX_REVISIONS,
        }
    }

    pub fn add_stage(mut self, agent: Arc<dyn Agent>, task: Task) -> Self {
        self.stages.push(Stage { agent, task });
        self
    }

    pub fn with_max_revisions(mut self, max_revisions: u32) -> Self {
        self.max_revisions = max_revisions;
        self
    }

    fn with_feedback(task: &Task, feedback: &str) -> Task {
        let mut revised = task.clone();
        revised.description = format!(
            "{}\n\nThe manager sent the previous attempt back. Address this feedback:\n{}",
            task.description,
            feedback.trim()
        );
        revised
    }

    /// Run one stage under review. Both outcomes carry the revisions made so far.
    async fn supervise(
        &self,
        stage: &Stage,
        context: Option<&str>,
    ) -> std::result::Result<(AgentMessage, u32), (AgentMessage, u32)> {
        let agent = &stage.agent;
        let base_task = prepare_task(stage, context);
        let mut task = base_task.clone();
        let mut revisions = 0;

        loop {
            let output = agent.process_task(&task).await.map_err(|e| {
                error!(workflow = %self.name, agent = %agent.id(), error = %e, "Step failed");
                (failure_message(agent.id(), &e), revisions)
            })?;

            let review = self
                .manager
                .review(&task, agent.name(), &output)
                .await
                .map_err(|e| {
                    error!(workflow = %self.name, agent = %self.manager.id(), error = %e, "Review failed");
                    (failure_message(self.manager.id(), &e), revisions)
                })?;

            if review.approved {
                return Ok((output, revisions));
            }
            if revisions >= self.max_revisions {
                warn!(
                    workflow = %self.name,
                    agent = %agent.id(),
                    revisions,
                    feedback = %review.feedback,
                    "Revision limit reached, accepting last output"
                );
                return Ok((output, revisions));
            }

            revisions += 1;
            info!(
                workflow = %self.name,
                agent = %agent.id(),
                revision = revisions,
                feedback = %review.feedback,
                "Manager requested a revision"
            );
            task = Self::with_feedback(&base_task, &review.feedback);
        }
    }
}

#[async_trait]
impl Workflow for HierarchicalWorkflow {
    async fn run(&self) -> Result<WorkflowResult> {
        let start_time = Instant::now();

        info!(
            workflow = %self.name,
            stage_count = self.stages.len(),
            max_revisions = self.max_revisions,
            "Starting hierarchical workflow"
        );

        if self.stages.is_empty() {
            warn!(workflow = %self.name, "Workflow has no stages");
            return Ok(WorkflowResult {
                workflow_name: self.name.clone(),
                step_results: Vec::new(),
                final_output: AgentMessage::system("Workflow has no stages"),
                success: false,
                duration_ms: elapsed_ms(start_time),
            });
        }

        let mut step_results = Vec::new();
        let mut last_output: Option<AgentMessage> = None;

        for stage in &self.stages {
            let step_start = Instant::now();
            let context = last_output.as_ref().map(|m| m.content.clone());

            match self.supervise(stage, context.as_deref()).await {
                Ok((output, revisions)) => {
                    step_results.push(StepResult {
                        agent_name: stage.agent.name().to_string(),
                        agent_id: stage.agent.id().to_string(),
                        output: output.clone(),
                        success: true,
                        duration_ms: elapsed_ms(step_start),
                        revisions,
                    });
                    last_output = Some(output);
                }
                Err((message, revisions)) => {
                    step_results.push(StepResult {
                        agent_name: stage.agent.name().to_string(),
                        agent_id: stage.agent.id().to_string(),
                        output: message.clone(),
                        success: false,
                        duration_ms: elapsed_ms(step_start),
                        revisions,
                    });
                    return Ok(WorkflowResult {
                        workflow_name: self.name.clone(),
                        step_results,
                        final_output: message,
                        success: false,
                        duration_ms: elapsed_ms(start_time),
                    });
                }
            }
        }

        info!(
            workflow = %self.name,
            steps = step_results.len(),
            revisions = step_results.iter().map(|s| s.revisions).sum::<u32>(),
            duration_ms = elapsed_ms(start_time),
            "Workflow completed"
        );

        Ok(WorkflowResult {
            workflow_name: self.name.clone(),
            step_results,
            final_output: last_output
                .unwrap_or_else(|| AgentMessage::system("No output produced")),
            success: true,
            duration_ms: elapsed_ms(start_time),
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}
