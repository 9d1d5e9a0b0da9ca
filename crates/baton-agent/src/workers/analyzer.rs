//! Analyzer worker: produces an execution strategy from task and context.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tokio::time::sleep;
use tracing::debug;

use baton_core::{Error, ExecutionStep, Result};

use crate::worker::{StepContext, Worker};

/// Simulated analysis latency.
const ANALYSIS_DELAY: Duration = Duration::from_millis(150);

/// Maximum length of the task summary embedded in the strategy document.
const SUMMARY_LIMIT: usize = 100;

/// Produces a structured execution strategy for a task.
///
/// Emits a JSON document describing the task summary, estimated
/// complexity, and the worker roles involved.
pub struct AnalyzerWorker;

#[async_trait]
impl Worker for AnalyzerWorker {
    async fn execute(&self, step: &ExecutionStep, context: &StepContext) -> Result<String> {
        let task = step.input.get("task").map_or("", String::as_str);
        let retrieved = step
            .input
            .get("context_step")
            .and_then(|step_id| context.get(step_id));

        // Simulate analysis work
        sleep(ANALYSIS_DELAY).await;

        let summary: String = task.chars().take(SUMMARY_LIMIT).collect();
        let strategy = json!({
            "task_summary": summary,
            "complexity_level": "medium",
            "required_workers": ["retriever", "analyzer", "writer"],
            "estimated_steps": 3,
            "context_used": retrieved.is_some(),
            "strategy": "Sequential execution with context enrichment",
        });

        debug!("Produced execution strategy for step {}", step.id);

        serde_json::to_string_pretty(&strategy)
            .map_err(|error| Error::StepExecution(error.to_string()))
    }
}
