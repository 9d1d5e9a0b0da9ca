//! Execution plan building.
//!
//! A planner turns raw task input into an ordered step list. The
//! orchestrator never assumes a particular plan shape beyond "at least one
//! step"; the built-in planner produces the reference
//! retrieve -> analyze -> write pipeline.

use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;
use tracing::debug;

use baton_core::{Error, ExecutionPlan, ExecutionStep, Result, TaskId, WorkerRole};

/// Simulated planning latency.
const PLANNING_DELAY: Duration = Duration::from_millis(200);

/// Builds an execution plan for a task.
#[async_trait]
pub trait Planner: Send + Sync {
    /// Builds an ordered, non-empty plan from the task input.
    ///
    /// # Errors
    /// Returns `Error::Planning` if no usable plan can be produced; an
    /// empty plan is never valid.
    async fn build(&self, task_id: TaskId, input: &str) -> Result<ExecutionPlan>;
}

/// The reference planner: a fixed retrieve -> analyze -> write pipeline.
///
/// Deterministic for identical input. Step ids are numbered within the
/// plan, and each step's input parameters name the earlier steps whose
/// outputs it consumes.
pub struct ThreeStepPlanner;

impl ThreeStepPlanner {
    fn step_id(position: usize) -> String {
        format!("step_{position:03}")
    }
}

#[async_trait]
impl Planner for ThreeStepPlanner {
    async fn build(&self, task_id: TaskId, input: &str) -> Result<ExecutionPlan> {
        if input.trim().is_empty() {
            return Err(Error::Planning("task input is empty".to_owned()));
        }

        // Simulate analysis latency
        sleep(PLANNING_DELAY).await;

        let retrieve_id = Self::step_id(1);
        let analyze_id = Self::step_id(2);
        let write_id = Self::step_id(3);

        let steps = vec![
            ExecutionStep::new(
                retrieve_id.clone(),
                WorkerRole::Retriever,
                "Retrieve relevant context for the task",
            )
            .with_input("query", input),
            ExecutionStep::new(
                analyze_id.clone(),
                WorkerRole::Analyzer,
                "Create detailed execution strategy",
            )
            .with_input("task", input)
            .with_input("context_step", retrieve_id.clone()),
            ExecutionStep::new(
                write_id,
                WorkerRole::Writer,
                "Generate final output based on analysis",
            )
            .with_input("task", input)
            .with_input("context_step", retrieve_id)
            .with_input("analysis_step", analyze_id),
        ];

        debug!("Planned {} steps for task {task_id}", steps.len());
        Ok(ExecutionPlan::new(task_id, steps))
    }
}
