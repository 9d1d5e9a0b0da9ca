//! Built-in worker implementations.
//!
//! These are the reference workers: in-process stubs that simulate I/O
//! latency and produce canned results. Production deployments swap them
//! out through the registry without touching the orchestration core.

mod analyzer;
mod retriever;
mod writer;

pub use analyzer::AnalyzerWorker;
pub use retriever::RetrieverWorker;
pub use writer::WriterWorker;
