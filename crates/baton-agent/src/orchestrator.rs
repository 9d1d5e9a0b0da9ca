//! Process-wide task orchestrator.
//!
//! Owns the task registry, enforces bounded concurrent execution through a
//! counting-semaphore admission gate, drives each task's execution loop,
//! and streams progress events to the caller.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

use baton_core::{
    Error, EventChannel, ExecutionPlan, IgnoreLock as _, OrchestratorConfig, Result, StepStatus,
    StreamEvent, Task, TaskId, TaskStatus,
};

use crate::planner::{Planner, ThreeStepPlanner};
use crate::retry::{RetryOutcome, RetryPolicy};
use crate::worker::{StepContext, Worker, WorkerRegistry};

/// Streamed step output is truncated to this many characters.
const PARTIAL_OUTPUT_LIMIT: usize = 500;

/// Final output embedded in the terminal event is truncated to this many
/// characters.
const FINAL_OUTPUT_LIMIT: usize = 1000;

/// Task registry plus the set of task ids currently claimed by an
/// execution loop. One lock guards both so claiming is atomic with the
/// status check.
#[derive(Default)]
struct TaskTable {
    tasks: HashMap<TaskId, Task>,
    running: HashSet<TaskId>,
}

/// Coordinates multi-worker task execution.
///
/// The orchestrator is the single ownership boundary for task state:
/// exactly one execution loop mutates a given task, and every read
/// returns an immutable snapshot.
pub struct Orchestrator {
    config: OrchestratorConfig,
    planner: Arc<dyn Planner>,
    workers: Arc<WorkerRegistry>,
    table: Arc<Mutex<TaskTable>>,
    admission: Arc<Semaphore>,
    retry: RetryPolicy,
}

impl Orchestrator {
    /// Creates an orchestrator with the given configuration, the built-in
    /// planner, and the default worker set.
    pub fn new(config: OrchestratorConfig) -> Self {
        let admission = Arc::new(Semaphore::new(config.max_concurrent_tasks));
        let retry = RetryPolicy::new(config.backoff_base());
        Self {
            config,
            planner: Arc::new(ThreeStepPlanner),
            workers: Arc::new(WorkerRegistry::with_defaults()),
            table: Arc::new(Mutex::new(TaskTable::default())),
            admission,
            retry,
        }
    }

    /// Replaces the plan builder.
    #[must_use]
    pub fn with_planner(mut self, planner: Arc<dyn Planner>) -> Self {
        self.planner = planner;
        self
    }

    /// Replaces the worker registry.
    #[must_use]
    pub fn with_workers(mut self, workers: WorkerRegistry) -> Self {
        self.workers = Arc::new(workers);
        self
    }

    /// Gets the orchestrator configuration.
    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Registers a new task and returns its id.
    ///
    /// The task starts in `Pending`; this never blocks on execution.
    pub fn create_task(&self, input: String) -> TaskId {
        let task = Task::new(input);
        let task_id = task.id;

        let mut guard = self.table.lock_ignore_poison();
        guard.tasks.insert(task_id, task);
        drop(guard);

        info!("Created task {task_id}");
        task_id
    }

    /// Starts executing a task and returns its event stream.
    ///
    /// The stream delivers events in execution order and ends after exactly
    /// one terminal event. Events begin only once the admission gate grants
    /// a slot; until then the task stays `Pending`. Dropping the receiver
    /// abandons the stream without disturbing execution.
    ///
    /// # Errors
    /// Returns `Error::NotFound` for an unknown id, `Error::AlreadyRunning`
    /// if an execution loop already claimed the task, or
    /// `Error::AlreadyTerminal` if the task already finished.
    pub fn execute_task(&self, task_id: TaskId) -> Result<UnboundedReceiver<StreamEvent>> {
        let input = {
            let mut guard = self.table.lock_ignore_poison();
            let table = &mut *guard;

            let task = table.tasks.get(&task_id).ok_or(Error::NotFound(task_id))?;
            if task.is_terminal() {
                return Err(Error::AlreadyTerminal(task_id));
            }
            let input = task.input.clone();

            if !table.running.insert(task_id) {
                return Err(Error::AlreadyRunning(task_id));
            }
            input
        };

        let (events, receiver) = EventChannel::new();
        let runner = TaskRunner {
            config: self.config.clone(),
            planner: Arc::clone(&self.planner),
            workers: Arc::clone(&self.workers),
            table: Arc::clone(&self.table),
            admission: Arc::clone(&self.admission),
            retry: self.retry,
        };

        // Detached: the loop finishes on its own even if the consumer
        // abandons the stream.
        drop(tokio::spawn(runner.run(task_id, input, events)));

        Ok(receiver)
    }

    /// Gets a read-only snapshot of a task.
    ///
    /// # Errors
    /// Returns `Error::NotFound` if the id is unknown.
    pub fn get_task_state(&self, task_id: TaskId) -> Result<Task> {
        let guard = self.table.lock_ignore_poison();
        guard
            .tasks
            .get(&task_id)
            .cloned()
            .ok_or(Error::NotFound(task_id))
    }

    /// Gets read-only snapshots of all registered tasks, oldest first.
    pub fn list_tasks(&self) -> Vec<Task> {
        let guard = self.table.lock_ignore_poison();
        let mut tasks: Vec<Task> = guard.tasks.values().cloned().collect();
        drop(guard);
        tasks.sort_by_key(|task| task.created_at);
        tasks
    }
}

/// Everything one execution loop needs, detached from the orchestrator so
/// the loop can run in its own tokio task.
#[derive(Clone)]
struct TaskRunner {
    config: OrchestratorConfig,
    planner: Arc<dyn Planner>,
    workers: Arc<WorkerRegistry>,
    table: Arc<Mutex<TaskTable>>,
    admission: Arc<Semaphore>,
    retry: RetryPolicy,
}

impl TaskRunner {
    /// Drives the task to a terminal state, then releases its claim.
    async fn run(self, task_id: TaskId, input: String, events: EventChannel) {
        self.execute(task_id, input, &events).await;

        let mut guard = self.table.lock_ignore_poison();
        guard.running.remove(&task_id);
    }

    /// The execution loop proper. The admission permit is held for the
    /// whole body and released on every exit path when it drops.
    async fn execute(&self, task_id: TaskId, input: String, events: &EventChannel) {
        let permit = match Arc::clone(&self.admission).acquire_owned().await {
            Ok(permit) => permit,
            Err(closed) => {
                // The gate is never closed while the orchestrator lives.
                let message = format!("admission gate closed: {closed}");
                self.fail_task(task_id, events, message.clone(), message, None, None);
                return;
            }
        };

        self.update_task(task_id, Task::mark_analyzing);
        info!("Analyzing task {task_id}");

        let mut plan = match self.build_plan(task_id, &input).await {
            Ok(plan) => plan,
            Err(planning_error) => {
                let message = planning_error.to_string();
                error!("Task {task_id} planning failed: {message}");
                self.fail_task(task_id, events, message.clone(), message, None, None);
                return;
            }
        };

        // Resolve every role up front; a plan naming an unregistered role
        // fails before any step runs.
        let mut step_workers: Vec<Arc<dyn Worker>> = Vec::with_capacity(plan.len());
        for step in &plan.steps {
            match self.workers.resolve(step.role) {
                Some(worker) => step_workers.push(worker),
                None => {
                    let message = format!("no worker registered for role {}", step.role);
                    error!("Task {task_id} planning failed: {message}");
                    self.fail_task(task_id, events, message.clone(), message, None, None);
                    return;
                }
            }
        }

        // The configured retry budget applies to every step.
        for step in &mut plan.steps {
            step.max_retries = self.config.max_retries;
        }

        let total_steps = plan.len();
        self.update_task(task_id, |task| task.mark_executing(plan.clone()));
        info!("Task {task_id} executing {total_steps} steps");

        let mut context = StepContext::default();
        let mut final_output = String::new();

        for (index, planned) in plan.steps.iter().enumerate() {
            let mut step = planned.clone();

            self.update_task(task_id, |task| {
                task.current_step = index;
                if let Some(task_plan) = task.plan.as_mut()
                    && let Some(entry) = task_plan.steps.get_mut(index)
                {
                    entry.status = StepStatus::Running;
                }
            });

            events.step_started(
                task_id,
                step.id.clone(),
                index + 1,
                total_steps,
                step.description.clone(),
                step.role,
            );

            let outcome = self
                .retry
                .run(&mut step, &context, &step_workers[index])
                .await;

            match outcome {
                RetryOutcome::Success => {
                    let output = step.output.clone().unwrap_or_default();
                    context.insert(step.id.clone(), output.clone());

                    self.update_task(task_id, |task| {
                        task.context.insert(step.id.clone(), output.clone());
                        task.current_step = index + 1;
                        if let Some(task_plan) = task.plan.as_mut()
                            && let Some(entry) = task_plan.steps.get_mut(index)
                        {
                            *entry = step.clone();
                        }
                    });

                    events.partial_output(
                        task_id,
                        step.id.clone(),
                        truncate(&output, PARTIAL_OUTPUT_LIMIT),
                    );
                    events.step_completed(task_id, step.id.clone(), step.status);

                    final_output = output;
                }
                RetryOutcome::Exhausted => {
                    let step_error = step.error.clone().unwrap_or_default();
                    let attempts = step.retry_count.max(1);
                    let message =
                        format!("Step {} failed after {attempts} attempt(s): {step_error}", step.id);
                    error!("Task {task_id} failed: {message}");

                    self.update_task(task_id, |task| {
                        if let Some(task_plan) = task.plan.as_mut()
                            && let Some(entry) = task_plan.steps.get_mut(index)
                        {
                            *entry = step.clone();
                        }
                    });
                    self.fail_task(
                        task_id,
                        events,
                        message,
                        step_error,
                        Some(step.id.clone()),
                        Some(step.retry_count),
                    );
                    return;
                }
            }
        }

        self.update_task(task_id, |task| task.mark_completed(final_output.clone()));
        info!("Task {task_id} completed");

        events.task_completed(
            task_id,
            TaskStatus::Completed,
            truncate(&final_output, FINAL_OUTPUT_LIMIT),
            total_steps,
        );

        drop(permit);
    }

    /// Invokes the planner and rejects empty plans.
    async fn build_plan(&self, task_id: TaskId, input: &str) -> Result<ExecutionPlan> {
        let plan = self.planner.build(task_id, input).await?;
        if plan.is_empty() {
            return Err(Error::Planning("planner produced an empty plan".to_owned()));
        }
        Ok(plan)
    }

    /// Marks the task failed and emits the terminal error event.
    ///
    /// `message` lands on the task snapshot, `event_error` in the event
    /// payload; for step failures the former wraps the latter with the
    /// step id and attempt count.
    fn fail_task(
        &self,
        task_id: TaskId,
        events: &EventChannel,
        message: String,
        event_error: String,
        step_id: Option<String>,
        retry_count: Option<u32>,
    ) {
        self.update_task(task_id, |task| task.mark_failed(message.clone()));
        events.error(task_id, step_id, event_error, retry_count);
    }

    /// Applies a mutation to the task under the registry lock.
    ///
    /// Single-writer discipline: only the loop that claimed the task calls
    /// this, so readers can only ever observe consistent snapshots.
    fn update_task(&self, task_id: TaskId, mutate: impl FnOnce(&mut Task)) {
        let mut guard = self.table.lock_ignore_poison();
        match guard.tasks.get_mut(&task_id) {
            Some(task) => {
                mutate(task);
                task.touch();
            }
            None => warn!("Task {task_id} vanished from the registry"),
        }
    }
}

/// Truncates text to a maximum number of characters for streaming.
fn truncate(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}
