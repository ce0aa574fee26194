use std::collections::VecDeque;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use mercato_core::{AdapterStatus, OrchestratorConfig};

/// Mutable health state for one registered adapter.
///
/// Owned exclusively by the orchestrator behind a `std::sync::Mutex`; every
/// critical section is a few arithmetic operations with no await points.
pub(crate) struct AdapterHealth {
    /// Last-known status; only `is_operational` statuses are selectable.
    pub status: AdapterStatus,
    /// EWMA of call outcomes, 1.0 = every recent call succeeded.
    pub success_rate: f64,
    /// Total calls dispatched to this adapter since registration.
    pub usage_count: u64,
    /// Timestamps of calls inside the rolling rate window.
    window: VecDeque<Instant>,
    /// While set and in the future, the adapter scores below all others.
    cooldown_until: Option<Instant>,
}

impl AdapterHealth {
    pub(crate) fn new(status: AdapterStatus) -> Self {
        Self {
            status,
            success_rate: 1.0,
            usage_count: 0,
            window: VecDeque::new(),
            cooldown_until: None,
        }
    }

    fn prune(&mut self, now: Instant, window: Duration) {
        while let Some(&front) = self.window.front() {
            if now.duration_since(front) > window {
                self.window.pop_front();
            } else {
                break;
            }
        }
    }

    /// Count a dispatched call against the rolling window.
    pub(crate) fn record_attempt(&mut self, now: Instant, window: Duration) {
        self.prune(now, window);
        self.window.push_back(now);
        self.usage_count += 1;
    }

    /// Fold one outcome into the EWMA and enter cooldown when the rate sinks
    /// below the configured floor.
    pub(crate) fn record_outcome(
        &mut self,
        adapter: &str,
        success: bool,
        cfg: &OrchestratorConfig,
        now: Instant,
    ) {
        let outcome = if success { 1.0 } else { 0.0 };
        self.success_rate = (1.0 - cfg.ewma_alpha) * self.success_rate + cfg.ewma_alpha * outcome;
        if success && self.status == AdapterStatus::Ready {
            self.status = AdapterStatus::Available;
        }
        if !success && self.success_rate < cfg.min_success_rate && !self.in_cooldown(now) {
            warn!(
                adapter,
                success_rate = self.success_rate,
                cooldown_secs = cfg.cooldown.as_secs(),
                "success rate below floor, entering cooldown"
            );
            self.cooldown_until = Some(now + cfg.cooldown);
        }
    }

    /// Put the adapter into cooldown regardless of its success rate.
    pub(crate) fn force_cooldown(&mut self, adapter: &str, now: Instant, duration: Duration) {
        info!(adapter, secs = duration.as_secs(), "forced cooldown");
        self.cooldown_until = Some(now + duration);
    }

    pub(crate) fn in_cooldown(&self, now: Instant) -> bool {
        self.cooldown_until.is_some_and(|until| now < until)
    }

    /// Calls inside the rolling window as of `now`.
    pub(crate) fn recent_requests(&mut self, now: Instant, window: Duration) -> usize {
        self.prune(now, window);
        self.window.len()
    }

    /// Operator reset: forget failures and adopt a freshly probed status.
    pub(crate) fn reset(&mut self, status: AdapterStatus) {
        self.status = status;
        self.success_rate = 1.0;
        self.cooldown_until = None;
        self.window.clear();
    }
}
