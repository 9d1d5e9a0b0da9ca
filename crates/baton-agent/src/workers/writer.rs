//! Writer worker: renders the final deliverable.

use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;
use tracing::debug;

use baton_core::{ExecutionStep, Result};

use crate::worker::{StepContext, Worker};

/// Simulated generation latency.
const GENERATION_DELAY: Duration = Duration::from_millis(100);

/// Generates the final report from the task, retrieved context, and
/// analysis produced by earlier steps.
pub struct WriterWorker;

#[async_trait]
impl Worker for WriterWorker {
    async fn execute(&self, step: &ExecutionStep, context: &StepContext) -> Result<String> {
        let task = step.input.get("task").map_or("", String::as_str);
        let retrieved = step
            .input
            .get("context_step")
            .and_then(|step_id| context.get(step_id))
            .map_or("", String::as_str);
        let analysis = step
            .input
            .get("analysis_step")
            .and_then(|step_id| context.get(step_id))
            .map_or("", String::as_str);

        // Simulate generation work
        sleep(GENERATION_DELAY).await;

        debug!("Rendering final report for step {}", step.id);

        Ok(format!(
            "\
# Task Execution Report

## Original Task
{task}

## Retrieved Context
{retrieved}

## Analysis
{analysis}

## Final Output
The task has been analyzed and executed through a multi-worker pipeline:

1. **Retrieval Phase**: Relevant context was gathered from the knowledge base
2. **Analysis Phase**: The task was decomposed into structured steps
3. **Generation Phase**: This report was generated

## Execution Summary
- Status: Completed successfully
- All workers performed their designated roles
- Output generated with full context awareness
"
        ))
    }
}
