use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use mercato_core::AdapterStatus;

/// Point-in-time snapshot of one adapter's registration and health.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdapterInfo {
    /// Adapter name.
    pub name: String,
    /// Human description from the adapter itself.
    pub description: String,
    /// Last-known status.
    pub status: AdapterStatus,
    /// Configured priority (lower is preferred).
    pub priority: u32,
    /// EWMA success rate in `[0, 1]`.
    pub success_rate: f64,
    /// Total calls dispatched since registration.
    pub usage_count: u64,
    /// Calls inside the rolling rate window.
    pub recent_requests: usize,
    /// True while the adapter is in cooldown.
    pub in_cooldown: bool,
    /// Kind labels the adapter serves.
    pub supported_kinds: Vec<String>,
}

/// Aggregated health snapshot across all registered adapters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    /// When the snapshot was taken.
    pub generated_at: DateTime<Utc>,
    /// Number of adapters whose status is operational.
    pub operational: usize,
    /// Total registered adapters.
    pub total: usize,
    /// Per-adapter snapshots, in registration order.
    pub adapters: Vec<AdapterInfo>,
}

impl HealthReport {
    /// True when at least one adapter can serve requests.
    #[must_use]
    pub const fn any_operational(&self) -> bool {
        self.operational > 0
    }
}
