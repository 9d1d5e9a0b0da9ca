//! Core task types and the task state machine

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::plan::ExecutionPlan;

/// Unique identifier for a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(Uuid);

impl Default for TaskId {
    fn default() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(formatter)
    }
}

/// Task lifecycle state.
///
/// Transitions are monotonic: `Pending -> Analyzing -> Executing` and then
/// either `Completed` or `Failed`. Terminal states are absorbing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Task registered, plan not yet built
    #[default]
    Pending,
    /// Plan-builder invocation in flight
    Analyzing,
    /// Steps are being run in order
    Executing,
    /// All steps succeeded
    Completed,
    /// A step exhausted its retries, or planning failed
    Failed,
}

impl TaskStatus {
    /// Checks whether this status is terminal.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// One user request through its full lifecycle.
///
/// Mutated only by the orchestrator's execution loop for its task id;
/// everything outside the orchestrator sees cloned snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier for this task
    pub id: TaskId,
    /// Original user input
    pub input: String,
    /// Current lifecycle state
    pub status: TaskStatus,
    /// Execution plan, populated once analysis completes
    pub plan: Option<ExecutionPlan>,
    /// Index of the next step to run
    pub current_step: usize,
    /// Outputs of completed steps, keyed by step id
    pub context: HashMap<String, String>,
    /// Final output, set if and only if the task completed
    pub final_output: Option<String>,
    /// Error message, set if and only if the task failed
    pub error_message: Option<String>,
    /// When the task was created
    pub created_at: DateTime<Utc>,
    /// When the task was last updated
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Creates a new pending task for the given input.
    pub fn new(input: String) -> Self {
        let now = Utc::now();
        Self {
            id: TaskId::default(),
            input,
            status: TaskStatus::Pending,
            plan: None,
            current_step: 0,
            context: HashMap::default(),
            final_output: None,
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Checks whether the task reached a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Refreshes the last-updated timestamp.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Marks the task as analyzing (plan building in flight).
    pub fn mark_analyzing(&mut self) {
        self.status = TaskStatus::Analyzing;
        self.touch();
    }

    /// Marks the task as executing and attaches its plan.
    pub fn mark_executing(&mut self, plan: ExecutionPlan) {
        self.plan = Some(plan);
        self.status = TaskStatus::Executing;
        self.touch();
    }

    /// Marks the task as completed with its final output.
    pub fn mark_completed(&mut self, final_output: String) {
        self.status = TaskStatus::Completed;
        self.final_output = Some(final_output);
        self.touch();
    }

    /// Marks the task as failed with an error message.
    ///
    /// Step outputs accumulated so far stay in the context for diagnostics;
    /// the final output is never populated on failure.
    pub fn mark_failed(&mut self, message: String) {
        self.status = TaskStatus::Failed;
        self.error_message = Some(message);
        self.touch();
    }
}
