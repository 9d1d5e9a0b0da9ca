//! Retriever worker: fetches relevant context for a query.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;
use tracing::debug;

use baton_core::{ExecutionStep, Result};

use crate::worker::{StepContext, Worker};

/// Simulated lookup latency.
const RETRIEVAL_DELAY: Duration = Duration::from_millis(100);

/// Maximum number of documents returned per query.
const MAX_DOCUMENTS: usize = 3;

/// Retrieves relevant context for a given query.
///
/// Backed by a canned in-memory knowledge base; a production replacement
/// would connect to a vector store, search engine, or API.
pub struct RetrieverWorker {
    knowledge_base: HashMap<&'static str, Vec<&'static str>>,
}

impl RetrieverWorker {
    /// Creates a retriever with the built-in knowledge base.
    pub fn new() -> Self {
        let mut knowledge_base = HashMap::new();
        knowledge_base.insert(
            "task execution",
            vec![
                "Tasks are broken into atomic steps",
                "Each step has a clear input and output",
                "Steps can be executed sequentially or in parallel",
            ],
        );
        knowledge_base.insert(
            "ai systems",
            vec![
                "AI systems require orchestration layers",
                "Agents specialize in specific tasks",
                "Streaming enables real-time feedback",
            ],
        );
        knowledge_base.insert(
            "async programming",
            vec![
                "Async/await enables concurrent execution",
                "Queues manage task distribution",
                "Backpressure prevents system overload",
            ],
        );
        Self { knowledge_base }
    }

    /// Matches the query against knowledge-base categories by keyword.
    fn lookup(&self, query: &str) -> Vec<&'static str> {
        let query_lower = query.to_lowercase();

        let mut documents: Vec<&'static str> = Vec::new();
        for (category, docs) in &self.knowledge_base {
            if category
                .split_whitespace()
                .any(|keyword| query_lower.contains(keyword))
            {
                documents.extend_from_slice(docs);
            }
        }

        if documents.is_empty() {
            documents = vec![
                "Context retrieval system is operational",
                "Multiple knowledge sources are available",
            ];
        }

        documents.truncate(MAX_DOCUMENTS);
        documents
    }
}

impl Default for RetrieverWorker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Worker for RetrieverWorker {
    async fn execute(&self, step: &ExecutionStep, _context: &StepContext) -> Result<String> {
        let query = step.input.get("query").map_or("", String::as_str);

        // Simulate I/O latency
        sleep(RETRIEVAL_DELAY).await;

        let documents = self.lookup(query);
        debug!("Retrieved {} documents for step {}", documents.len(), step.id);

        Ok(documents
            .iter()
            .map(|doc| format!("- {doc}"))
            .collect::<Vec<_>>()
            .join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use baton_core::WorkerRole;

    #[tokio::test]
    async fn test_matches_known_category() {
        let worker = RetrieverWorker::new();
        let step = ExecutionStep::new("step_001", WorkerRole::Retriever, "Retrieve")
            .with_input("query", "the benefits of async programming");

        let output = worker
            .execute(&step, &StepContext::default())
            .await
            .expect("retrieval succeeds");

        assert!(output.contains("Async/await enables concurrent execution"));
        assert!(output.lines().all(|line| line.starts_with("- ")));
        assert!(output.lines().count() <= MAX_DOCUMENTS);
    }

    #[tokio::test]
    async fn test_falls_back_on_unknown_query() {
        let worker = RetrieverWorker::new();
        let step = ExecutionStep::new("step_001", WorkerRole::Retriever, "Retrieve")
            .with_input("query", "quarterly sales numbers");

        let output = worker
            .execute(&step, &StepContext::default())
            .await
            .expect("retrieval succeeds");

        assert!(output.contains("Context retrieval system is operational"));
    }
}
