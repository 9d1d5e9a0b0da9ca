//! Integration tests for the orchestrator happy path.
//!
//! Tests the full flow: task creation, plan building, step execution with
//! the built-in workers, and event streaming.

#![cfg_attr(
    test,
    allow(
        clippy::expect_used,
        clippy::unwrap_used,
        clippy::panic,
        clippy::missing_panics_doc,
        clippy::tests_outside_test_module,
        reason = "Test allows"
    )
)]

use std::time::Duration;

use baton_agent::Orchestrator;
use baton_core::{Error, EventData, EventKind, OrchestratorConfig, StreamEvent, TaskStatus};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::timeout;

/// Helper to create an orchestrator with a short backoff for tests
fn create_test_orchestrator() -> Orchestrator {
    drop(
        tracing_subscriber::fmt()
            .with_env_filter("baton_agent=debug")
            .try_init(),
    );

    let config = OrchestratorConfig {
        max_concurrent_tasks: 4,
        max_retries: 3,
        backoff_base_ms: 10,
    };
    Orchestrator::new(config)
}

/// Drains the event stream until the producer closes it.
async fn collect_events(mut receiver: UnboundedReceiver<StreamEvent>) -> Vec<StreamEvent> {
    let mut events = Vec::new();
    let drained = timeout(Duration::from_secs(10), async {
        while let Some(event) = receiver.recv().await {
            events.push(event);
        }
    })
    .await;
    drained.expect("event stream should finish");
    events
}

fn kinds(events: &[StreamEvent]) -> Vec<EventKind> {
    events.iter().map(|event| event.event_type).collect()
}

#[tokio::test]
async fn test_task_is_pending_before_execution() {
    let orchestrator = create_test_orchestrator();
    let task_id = orchestrator.create_task("Analyze the benefits of async programming".to_owned());

    let snapshot = orchestrator.get_task_state(task_id).expect("task exists");
    assert_eq!(snapshot.status, TaskStatus::Pending);
    assert!(snapshot.plan.is_none());
    assert!(snapshot.final_output.is_none());
    assert!(snapshot.error_message.is_none());
}

#[tokio::test]
async fn test_repeated_reads_are_identical() {
    let orchestrator = create_test_orchestrator();
    let task_id = orchestrator.create_task("some task".to_owned());

    let first = orchestrator.get_task_state(task_id).expect("task exists");
    let second = orchestrator.get_task_state(task_id).expect("task exists");
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_end_to_end_happy_path() {
    let orchestrator = create_test_orchestrator();
    let task_id = orchestrator.create_task("Analyze the benefits of async programming".to_owned());

    let receiver = orchestrator.execute_task(task_id).expect("execution starts");
    let events = collect_events(receiver).await;

    // Three steps, each a started/partial/completed triple, then exactly
    // one terminal event.
    assert_eq!(
        kinds(&events),
        vec![
            EventKind::StepStarted,
            EventKind::PartialOutput,
            EventKind::StepCompleted,
            EventKind::StepStarted,
            EventKind::PartialOutput,
            EventKind::StepCompleted,
            EventKind::StepStarted,
            EventKind::PartialOutput,
            EventKind::StepCompleted,
            EventKind::TaskCompleted,
        ]
    );
    assert!(events.iter().all(|event| event.task_id == task_id));

    // Steps run in plan order.
    let started_ids: Vec<&str> = events
        .iter()
        .filter_map(|event| match &event.data {
            EventData::StepStarted { step_id, .. } => Some(step_id.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(started_ids, vec!["step_001", "step_002", "step_003"]);

    let snapshot = orchestrator.get_task_state(task_id).expect("task exists");
    assert_eq!(snapshot.status, TaskStatus::Completed);
    assert!(snapshot.error_message.is_none());
    assert_eq!(snapshot.context.len(), 3);
    assert_eq!(snapshot.current_step, 3);

    // The final output is the last step's output.
    let final_output = snapshot.final_output.expect("final output set");
    assert!(final_output.starts_with("# Task Execution Report"));
    assert_eq!(
        snapshot.context.get("step_003").map(String::as_str),
        Some(final_output.as_str())
    );

    // The terminal event carries the (possibly truncated) final output.
    match &events[events.len() - 1].data {
        EventData::TaskCompleted {
            status,
            final_output: streamed,
            total_steps,
        } => {
            assert_eq!(*status, TaskStatus::Completed);
            assert_eq!(*total_steps, 3);
            assert!(final_output.starts_with(streamed.as_str()));
        }
        other => panic!("expected task_completed payload, got {other:?}"),
    }
}

#[tokio::test]
async fn test_events_serialize_as_ndjson_objects() {
    let orchestrator = create_test_orchestrator();
    let task_id = orchestrator.create_task("Analyze the benefits of async programming".to_owned());

    let receiver = orchestrator.execute_task(task_id).expect("execution starts");
    let events = collect_events(receiver).await;

    for event in &events {
        let json = event.to_json().expect("event serializes");
        assert!(!json.contains('\n'));
        let value: serde_json::Value = serde_json::from_str(&json).expect("valid json");
        assert!(value["event_type"].is_string());
        assert!(value["task_id"].is_string());
        assert!(value["timestamp"].is_string());
        assert!(value["data"].is_object());
    }
}

#[tokio::test]
async fn test_get_state_of_unknown_task_fails() {
    let orchestrator = create_test_orchestrator();
    let unknown = orchestrator.create_task("probe".to_owned());
    drop(orchestrator);

    let fresh = create_test_orchestrator();
    let result = fresh.get_task_state(unknown);
    assert!(matches!(result, Err(Error::NotFound(_))));
}

#[tokio::test]
async fn test_execute_terminal_task_fails() {
    let orchestrator = create_test_orchestrator();
    let task_id = orchestrator.create_task("Analyze the benefits of async programming".to_owned());

    let receiver = orchestrator.execute_task(task_id).expect("execution starts");
    let events = collect_events(receiver).await;
    assert_eq!(events.last().map(|event| event.event_type), Some(EventKind::TaskCompleted));

    let result = orchestrator.execute_task(task_id);
    assert!(matches!(result, Err(Error::AlreadyTerminal(_))));
}

#[tokio::test]
async fn test_list_tasks_returns_snapshots() {
    let orchestrator = create_test_orchestrator();
    let first = orchestrator.create_task("first".to_owned());
    let second = orchestrator.create_task("second".to_owned());

    let tasks = orchestrator.list_tasks();
    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[0].id, first);
    assert_eq!(tasks[1].id, second);
    assert!(tasks.iter().all(|task| task.status == TaskStatus::Pending));
}
