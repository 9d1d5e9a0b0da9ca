//! Core types for the baton task orchestrator.
//!
//! This crate provides the task data model, the streaming event model,
//! error handling, and configuration used across the orchestration system.

/// Orchestrator configuration types.
pub mod config;
/// Error types and result definitions.
pub mod error;
/// Streaming events and channels for real-time execution updates.
pub mod streaming;
/// Synchronization utilities.
pub mod sync;
/// Task, plan, and step types.
pub mod task;

pub use config::OrchestratorConfig;
pub use error::{Error, Result};
pub use streaming::{EventChannel, EventData, EventKind, StreamEvent};
pub use sync::IgnoreLock;
pub use task::{ExecutionPlan, ExecutionStep, StepStatus, Task, TaskId, TaskStatus, WorkerRole};
