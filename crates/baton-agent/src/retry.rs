//! Bounded exponential-backoff retry for single step executions.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, warn};

use baton_core::{ExecutionStep, StepStatus};

use crate::worker::{StepContext, Worker};

/// Outcome of running a step through the retry controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryOutcome {
    /// The step completed; its output is recorded on the step.
    Success,
    /// All attempts failed; the last error is recorded on the step.
    Exhausted,
}

/// Wraps a single step execution with bounded exponential-backoff retry.
///
/// The per-step attempt budget comes from the step itself
/// (`max_retries`); the policy only owns the backoff base.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    backoff_base: Duration,
}

impl RetryPolicy {
    /// Creates a policy with the given backoff base duration.
    pub fn new(backoff_base: Duration) -> Self {
        Self { backoff_base }
    }

    /// Computes the delay before the next attempt.
    ///
    /// The delay doubles with each recorded failure:
    /// `backoff_base * 2^(retry_count - 1)`.
    pub fn delay_for(&self, retry_count: u32) -> Duration {
        self.backoff_base * 2_u32.pow(retry_count.saturating_sub(1))
    }

    /// Runs the step until it succeeds or its attempt budget is exhausted.
    ///
    /// Mutates the step in place: status, output, error, and retry count
    /// always reflect the last attempt when this returns. A step with
    /// `max_retries == 0` executes exactly once and fails immediately on
    /// error, with no backoff sleep.
    ///
    /// All worker failures are treated uniformly; no error type inspection
    /// happens here.
    pub async fn run(
        &self,
        step: &mut ExecutionStep,
        context: &StepContext,
        worker: &Arc<dyn Worker>,
    ) -> RetryOutcome {
        loop {
            step.status = StepStatus::Running;
            debug!(
                "Executing step {} (attempt {})",
                step.id,
                step.retry_count + 1
            );

            match worker.execute(step, context).await {
                Ok(output) => {
                    step.complete(output);
                    debug!("Step {} completed successfully", step.id);
                    return RetryOutcome::Success;
                }
                Err(error) => {
                    let message = error.to_string();
                    step.error = Some(message.clone());

                    if step.retry_count < step.max_retries {
                        step.retry_count += 1;
                        if step.retry_count < step.max_retries {
                            step.status = StepStatus::Retrying;
                            let delay = self.delay_for(step.retry_count);
                            warn!(
                                "Step {} failed, retrying in {:?}: {}",
                                step.id, delay, message
                            );
                            sleep(delay).await;
                            continue;
                        }
                    }

                    step.status = StepStatus::Failed;
                    warn!(
                        "Step {} failed after {} attempt(s): {}",
                        step.id,
                        step.retry_count.max(1),
                        message
                    );
                    return RetryOutcome::Exhausted;
                }
            }
        }
    }
}
