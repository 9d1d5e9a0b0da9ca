//! Streaming events for real-time task execution updates.
//!
//! Events are constructed by the orchestrator loop, delivered in order to
//! one consumer, and never persisted. Serialized form is one
//! self-contained JSON object per event with `event_type`, `task_id`,
//! `timestamp`, and `data` fields.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::task::{StepStatus, TaskId, TaskStatus, WorkerRole};

/// Channel for streaming events
pub mod channel;

pub use channel::EventChannel;

/// Kind of a streaming event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A step began executing
    StepStarted,
    /// A step produced output
    PartialOutput,
    /// A step finished successfully
    StepCompleted,
    /// The task finished successfully (terminal)
    TaskCompleted,
    /// The task failed (terminal)
    Error,
}

/// Kind-specific event payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventData {
    /// Payload for `EventKind::StepStarted`
    StepStarted {
        /// Id of the step that started
        step_id: String,
        /// 1-based position of the step in the plan
        step_number: usize,
        /// Total number of steps in the plan
        total_steps: usize,
        /// Human-readable step description
        description: String,
        /// Role of the worker assigned to the step
        worker_role: WorkerRole,
    },
    /// Payload for `EventKind::PartialOutput`
    PartialOutput {
        /// Id of the step that produced output
        step_id: String,
        /// Output produced so far (truncated for streaming)
        output: String,
    },
    /// Payload for `EventKind::StepCompleted`
    StepCompleted {
        /// Id of the step that completed
        step_id: String,
        /// Final step status
        status: StepStatus,
    },
    /// Payload for `EventKind::TaskCompleted`
    TaskCompleted {
        /// Terminal task status
        status: TaskStatus,
        /// Final output (truncated for streaming)
        final_output: String,
        /// Total number of steps executed
        total_steps: usize,
    },
    /// Payload for `EventKind::Error`
    Error {
        /// Id of the failed step, absent for plan-level failures
        #[serde(skip_serializing_if = "Option::is_none")]
        step_id: Option<String>,
        /// Error message
        error: String,
        /// Attempts recorded for the failed step, absent for plan-level failures
        #[serde(skip_serializing_if = "Option::is_none")]
        retry_count: Option<u32>,
    },
}

impl EventData {
    /// Gets the event kind this payload belongs to.
    pub fn kind(&self) -> EventKind {
        match self {
            Self::StepStarted { .. } => EventKind::StepStarted,
            Self::PartialOutput { .. } => EventKind::PartialOutput,
            Self::StepCompleted { .. } => EventKind::StepCompleted,
            Self::TaskCompleted { .. } => EventKind::TaskCompleted,
            Self::Error { .. } => EventKind::Error,
        }
    }
}

/// A single streaming event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamEvent {
    /// Kind of this event
    pub event_type: EventKind,
    /// Id of the task the event belongs to
    pub task_id: TaskId,
    /// When the event was emitted
    pub timestamp: DateTime<Utc>,
    /// Kind-specific payload
    pub data: EventData,
}

impl StreamEvent {
    /// Creates an event for the given task, stamped with the current time.
    pub fn new(task_id: TaskId, data: EventData) -> Self {
        Self {
            event_type: data.kind(),
            task_id,
            timestamp: Utc::now(),
            data,
        }
    }

    /// Checks whether this event terminates its stream.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.event_type,
            EventKind::TaskCompleted | EventKind::Error
        )
    }

    /// Serializes the event as a single JSON object for newline-delimited
    /// streaming.
    ///
    /// # Errors
    /// Returns an error if serialization fails
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn test_kind_mapping() {
        let data = EventData::PartialOutput {
            step_id: "step_001".to_owned(),
            output: "chunk".to_owned(),
        };
        assert_eq!(data.kind(), EventKind::PartialOutput);

        let event = StreamEvent::new(TaskId::default(), data);
        assert_eq!(event.event_type, EventKind::PartialOutput);
        assert!(!event.is_terminal());
    }

    #[test]
    fn test_terminal_events() {
        let completed = StreamEvent::new(
            TaskId::default(),
            EventData::TaskCompleted {
                status: TaskStatus::Completed,
                final_output: "report".to_owned(),
                total_steps: 3,
            },
        );
        assert!(completed.is_terminal());

        let failed = StreamEvent::new(
            TaskId::default(),
            EventData::Error {
                step_id: Some("step_002".to_owned()),
                error: "worker crashed".to_owned(),
                retry_count: Some(3),
            },
        );
        assert!(failed.is_terminal());
    }

    #[test]
    fn test_json_shape() {
        let event = StreamEvent::new(
            TaskId::default(),
            EventData::StepStarted {
                step_id: "step_001".to_owned(),
                step_number: 1,
                total_steps: 3,
                description: "Retrieve relevant context".to_owned(),
                worker_role: WorkerRole::Retriever,
            },
        );

        let json = event.to_json().expect("serialize event");
        let value: Value = serde_json::from_str(&json).expect("parse event json");

        assert_eq!(value["event_type"], "step_started");
        assert!(value["task_id"].is_string());
        assert!(value["timestamp"].is_string());
        assert_eq!(value["data"]["step_id"], "step_001");
        assert_eq!(value["data"]["step_number"], 1);
        assert_eq!(value["data"]["total_steps"], 3);
        assert_eq!(value["data"]["worker_role"], "retriever");
    }

    #[test]
    fn test_plan_failure_error_omits_step_fields() {
        let event = StreamEvent::new(
            TaskId::default(),
            EventData::Error {
                step_id: None,
                error: "planning failed: empty plan".to_owned(),
                retry_count: None,
            },
        );

        let json = event.to_json().expect("serialize event");
        let value: Value = serde_json::from_str(&json).expect("parse event json");

        assert_eq!(value["event_type"], "error");
        assert!(value["data"].get("step_id").is_none());
        assert!(value["data"].get("retry_count").is_none());
        assert_eq!(value["data"]["error"], "planning failed: empty plan");
    }
}
