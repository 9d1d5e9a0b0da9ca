//! Worker trait and role-based registry.
//!
//! Workers are interchangeable executors of plan steps. The orchestration
//! core sees exactly one capability: execute a step against the task's
//! accumulated context and produce a string result or fail. Role selects
//! the implementation at plan-build time; the registry resolves it at run
//! time.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use baton_core::{ExecutionStep, Result, WorkerRole};

use crate::workers::{AnalyzerWorker, RetrieverWorker, WriterWorker};

/// Accumulated per-task context: outputs of completed steps keyed by step id.
pub type StepContext = HashMap<String, String>;

/// A polymorphic executor of plan steps.
#[async_trait]
pub trait Worker: Send + Sync {
    /// Executes one step against the accumulated context.
    ///
    /// # Errors
    /// Returns an error if the worker cannot produce a result; the
    /// orchestration core treats all failures uniformly regardless of cause.
    async fn execute(&self, step: &ExecutionStep, context: &StepContext) -> Result<String>;
}

/// Role-indexed registry of worker implementations.
pub struct WorkerRegistry {
    workers: HashMap<WorkerRole, Arc<dyn Worker>>,
}

impl WorkerRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            workers: HashMap::default(),
        }
    }

    /// Creates a registry with the built-in worker for every role.
    pub fn with_defaults() -> Self {
        Self::new()
            .with_worker(WorkerRole::Retriever, Arc::new(RetrieverWorker::new()))
            .with_worker(WorkerRole::Analyzer, Arc::new(AnalyzerWorker))
            .with_worker(WorkerRole::Writer, Arc::new(WriterWorker))
    }

    /// Registers (or replaces) the worker for a role.
    #[must_use]
    pub fn with_worker(mut self, role: WorkerRole, worker: Arc<dyn Worker>) -> Self {
        self.workers.insert(role, worker);
        self
    }

    /// Resolves the worker registered for a role.
    pub fn resolve(&self, role: WorkerRole) -> Option<Arc<dyn Worker>> {
        self.workers.get(&role).map(Arc::clone)
    }
}

impl Default for WorkerRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_cover_every_role() {
        let registry = WorkerRegistry::with_defaults();
        assert!(registry.resolve(WorkerRole::Retriever).is_some());
        assert!(registry.resolve(WorkerRole::Analyzer).is_some());
        assert!(registry.resolve(WorkerRole::Writer).is_some());
    }

    #[test]
    fn test_empty_registry_resolves_nothing() {
        let registry = WorkerRegistry::new();
        assert!(registry.resolve(WorkerRole::Writer).is_none());
    }

    #[test]
    fn test_with_worker_replaces_existing() {
        struct NullWorker;

        #[async_trait]
        impl Worker for NullWorker {
            async fn execute(
                &self,
                _step: &ExecutionStep,
                _context: &StepContext,
            ) -> Result<String> {
                Ok(String::new())
            }
        }

        let registry =
            WorkerRegistry::with_defaults().with_worker(WorkerRole::Writer, Arc::new(NullWorker));
        assert!(registry.resolve(WorkerRole::Writer).is_some());
    }
}
