use tokio::sync::mpsc;
use tracing::warn;

use super::{EventData, StreamEvent};
use crate::task::{StepStatus, TaskId, TaskStatus, WorkerRole};

/// Channel for streaming execution events to one consumer.
#[derive(Clone)]
pub struct EventChannel {
    sender: mpsc::UnboundedSender<StreamEvent>,
}

impl EventChannel {
    /// Creates a channel plus the receiver handed to the stream consumer.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<StreamEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    /// Creates an event channel from an existing sender (for testing)
    pub fn from_sender(sender: mpsc::UnboundedSender<StreamEvent>) -> Self {
        Self { sender }
    }

    /// Sends a streaming event.
    ///
    /// Events are dropped if the consumer has abandoned the stream.
    pub fn send(&self, event: StreamEvent) {
        if let Err(error) = self.sender.send(event) {
            warn!("Dropping stream event, consumer is gone: {}", error);
        }
    }

    /// Sends a step started event
    pub fn step_started(
        &self,
        task_id: TaskId,
        step_id: String,
        step_number: usize,
        total_steps: usize,
        description: String,
        worker_role: WorkerRole,
    ) {
        self.send(StreamEvent::new(
            task_id,
            EventData::StepStarted {
                step_id,
                step_number,
                total_steps,
                description,
                worker_role,
            },
        ));
    }

    /// Sends a partial output event
    pub fn partial_output(&self, task_id: TaskId, step_id: String, output: String) {
        self.send(StreamEvent::new(
            task_id,
            EventData::PartialOutput { step_id, output },
        ));
    }

    /// Sends a step completed event
    pub fn step_completed(&self, task_id: TaskId, step_id: String, status: StepStatus) {
        self.send(StreamEvent::new(
            task_id,
            EventData::StepCompleted { step_id, status },
        ));
    }

    /// Sends the terminal task completed event
    pub fn task_completed(
        &self,
        task_id: TaskId,
        status: TaskStatus,
        final_output: String,
        total_steps: usize,
    ) {
        self.send(StreamEvent::new(
            task_id,
            EventData::TaskCompleted {
                status,
                final_output,
                total_steps,
            },
        ));
    }

    /// Sends the terminal error event
    pub fn error(
        &self,
        task_id: TaskId,
        step_id: Option<String>,
        error: String,
        retry_count: Option<u32>,
    ) {
        self.send(StreamEvent::new(
            task_id,
            EventData::Error {
                step_id,
                error,
                retry_count,
            },
        ));
    }
}
