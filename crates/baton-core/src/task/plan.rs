//! Execution plan and step types

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::core::TaskId;

/// Default maximum retry attempts per step.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Worker role a step is bound to.
///
/// The set is closed: role determines behavior, not identity, and the
/// orchestrator dispatches on it through one capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerRole {
    /// Fetches relevant context for the task
    Retriever,
    /// Produces an execution strategy from the task and context
    Analyzer,
    /// Generates the final output
    Writer,
}

impl fmt::Display for WorkerRole {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Retriever => "retriever",
            Self::Analyzer => "analyzer",
            Self::Writer => "writer",
        };
        formatter.write_str(name)
    }
}

/// Status of an individual step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    /// Step has not started yet
    #[default]
    Pending,
    /// A worker invocation is in flight
    Running,
    /// Last attempt failed, waiting out the backoff delay
    Retrying,
    /// Step produced its output
    Completed,
    /// Step exhausted its retries
    Failed,
}

/// One unit of work within a task's execution plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionStep {
    /// Step id, unique within its plan
    pub id: String,
    /// Worker role assigned to this step
    pub role: WorkerRole,
    /// Human-readable description of the step
    pub description: String,
    /// Input parameters for the worker
    pub input: HashMap<String, String>,
    /// Current step status
    pub status: StepStatus,
    /// Output, set once the step completes
    pub output: Option<String>,
    /// Last error recorded for this step
    pub error: Option<String>,
    /// Number of failed attempts recorded so far
    pub retry_count: u32,
    /// Maximum retry attempts for this step
    pub max_retries: u32,
}

impl ExecutionStep {
    /// Creates a new pending step.
    pub fn new(id: impl Into<String>, role: WorkerRole, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role,
            description: description.into(),
            input: HashMap::default(),
            status: StepStatus::Pending,
            output: None,
            error: None,
            retry_count: 0,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    /// Adds an input parameter.
    #[must_use]
    pub fn with_input(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.input.insert(key.into(), value.into());
        self
    }

    /// Marks the step as completed with its output.
    pub fn complete(&mut self, output: String) {
        self.status = StepStatus::Completed;
        self.output = Some(output);
        self.error = None;
    }
}

/// Ordered sequence of steps bound to one task.
///
/// Steps execute strictly in list order; the plan is immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionPlan {
    /// Id of the task that owns this plan
    pub task_id: TaskId,
    /// Steps in execution order
    pub steps: Vec<ExecutionStep>,
    /// When the plan was built
    pub created_at: DateTime<Utc>,
}

impl ExecutionPlan {
    /// Creates a plan for the given task.
    pub fn new(task_id: TaskId, steps: Vec<ExecutionStep>) -> Self {
        Self {
            task_id,
            steps,
            created_at: Utc::now(),
        }
    }

    /// Number of steps in the plan.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Checks whether the plan has no steps.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}
