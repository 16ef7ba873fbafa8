//! Workflow configuration.

use jam_core::{defaults, Error, Result};

use crate::batching::BatchStrategy;

/// Paging and batching settings for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkflowConfig {
    /// Maximum ids per move call.
    pub batch_size: usize,
    /// Rows per page in the view.
    pub page_size: usize,
    pub strategy: BatchStrategy,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            batch_size: defaults::BATCH_SIZE,
            page_size: defaults::PAGE_SIZE,
            strategy: BatchStrategy::default(),
        }
    }
}

impl WorkflowConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `JAM_BATCH_SIZE` | `100` | Max ids per move call |
    /// | `JAM_PAGE_SIZE` | `25` | Rows per page |
    /// | `JAM_MAX_IN_FLIGHT` | `1` | Concurrent move calls (1 = sequential) |
    pub fn from_env() -> Self {
        let batch_size = std::env::var(defaults::ENV_BATCH_SIZE)
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(defaults::BATCH_SIZE);

        let page_size = std::env::var(defaults::ENV_PAGE_SIZE)
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(defaults::PAGE_SIZE);

        let max_in_flight = std::env::var(defaults::ENV_MAX_IN_FLIGHT)
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(defaults::MAX_IN_FLIGHT);

        Self {
            batch_size,
            page_size,
            strategy: BatchStrategy::from_max_in_flight(max_in_flight),
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_strategy(mut self, strategy: BatchStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(Error::Config("batch_size must be positive".to_string()));
        }
        if self.page_size == 0 {
            return Err(Error::Config("page_size must be positive".to_string()));
        }
        if self.strategy.max_in_flight() == 0 {
            return Err(Error::Config("max_in_flight must be positive".to_string()));
        }
        Ok(())
    }
}
