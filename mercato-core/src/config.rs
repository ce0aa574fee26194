//! Configuration types shared between the orchestrator and its callers.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Strategy for retrieving data across the eligible adapters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RetrievalStrategy {
    /// Try adapters sequentially in score order; first non-empty success wins.
    #[default]
    FirstSuccess,
    /// Query the top-scored adapters concurrently and fuse their results.
    ParallelMerge,
    /// Fetch from the top two adapters and check that they agree before
    /// returning; fall back to `FirstSuccess` on disagreement.
    CrossValidate,
}

/// Per-adapter registration settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdapterConfig {
    /// Preference order; lower is preferred.
    pub priority: u32,
    /// Soft ceiling of requests per rolling minute; `None` disables the
    /// rate-pressure penalty for this adapter.
    pub rate_limit_per_minute: Option<u32>,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            priority: 100,
            rate_limit_per_minute: None,
        }
    }
}

impl AdapterConfig {
    /// Config with the given priority and no rate ceiling.
    #[must_use]
    pub const fn with_priority(priority: u32) -> Self {
        Self {
            priority,
            rate_limit_per_minute: None,
        }
    }
}

/// Global configuration for the orchestrator.
///
/// Every tunable of the health and selection model is a field here; the
/// defaults are the values the system was calibrated with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Default strategy when the caller does not pick one per call.
    pub strategy: RetrievalStrategy,
    /// Timeout for an individual adapter call.
    pub adapter_timeout: Duration,
    /// Smoothing factor for the per-adapter success-rate EWMA, in (0, 1].
    pub ewma_alpha: f64,
    /// Success rate below which an adapter is placed in cooldown.
    pub min_success_rate: f64,
    /// How long a cooldown lasts.
    pub cooldown: Duration,
    /// Rolling window over which per-adapter request rates are measured.
    pub rate_window: Duration,
    /// How many adapters `ParallelMerge` queries concurrently.
    pub parallel_fanout: usize,
    /// Relative price tolerance for `CrossValidate` agreement.
    pub cross_validate_tolerance: f64,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            strategy: RetrievalStrategy::default(),
            adapter_timeout: Duration::from_secs(5),
            ewma_alpha: 0.1,
            min_success_rate: 0.7,
            cooldown: Duration::from_secs(30),
            rate_window: Duration::from_secs(60),
            parallel_fanout: 3,
            cross_validate_tolerance: 0.01,
        }
    }
}
