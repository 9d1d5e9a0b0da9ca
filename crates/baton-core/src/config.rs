//! Configuration for the orchestrator: admission capacity, retry policy,
//! and backoff timing.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Orchestrator configuration.
///
/// All values are injected at orchestrator construction; nothing is read
/// from the environment at runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Maximum number of tasks executing concurrently (admission gate capacity)
    pub max_concurrent_tasks: usize,
    /// Maximum retry attempts per step
    pub max_retries: u32,
    /// Base delay for exponential backoff between retries, in milliseconds
    pub backoff_base_ms: u64,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_concurrent_tasks: 100,
            max_retries: 3,
            backoff_base_ms: 100,
        }
    }
}

impl OrchestratorConfig {
    /// Gets the backoff base as a duration.
    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }

    /// Load config from a specific file
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;

        tracing::debug!(
            "Loaded orchestrator config from {:?}: capacity={}, max_retries={}, backoff_base_ms={}",
            path,
            config.max_concurrent_tasks,
            config.max_retries,
            config.backoff_base_ms
        );

        Ok(config)
    }

    /// Save config to a specific file
    ///
    /// # Errors
    /// Returns an error if the file cannot be written
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|error| Error::Config(format!("Failed to serialize config: {error}")))?;

        let header = "# Baton Orchestrator Configuration File\n\
                      # Edit this file to customize your settings\n\n";

        fs::write(path, format!("{header}{contents}"))?;

        Ok(())
    }
}
