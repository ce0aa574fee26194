//! Adapter scoring.
//!
//! Higher scores are tried first. The weights are chosen so the terms
//! dominate strictly in this order: cooldown, rate pressure, success rate,
//! usage share, configured priority. An adapter in cooldown can therefore
//! never outrank one that is not, whatever its other terms look like.

/// Reward per unit of EWMA success rate.
const SUCCESS_WEIGHT: f64 = 10.0;
/// Penalty per unit of configured priority (lower priority value = preferred).
const PRIORITY_WEIGHT: f64 = 0.01;
/// Penalty per unit of recent-usage share, spreading load across peers.
const USAGE_WEIGHT: f64 = 1.0;
/// Flat penalty while the rolling window sits at the adapter's rate ceiling.
const RATE_LIMIT_PENALTY: f64 = 100.0;
/// Flat penalty while in cooldown; dwarfs every other term combined.
const COOLDOWN_PENALTY: f64 = 1e9;

/// Inputs to the score, snapshotted from one adapter's health under its lock.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ScoreInputs {
    pub success_rate: f64,
    pub priority: u32,
    /// This adapter's fraction of all recent requests across eligible peers.
    pub usage_share: f64,
    pub in_cooldown: bool,
    pub at_rate_limit: bool,
}

pub(crate) fn score(inputs: ScoreInputs) -> f64 {
    let mut s = inputs.success_rate * SUCCESS_WEIGHT
        - f64::from(inputs.priority) * PRIORITY_WEIGHT
        - inputs.usage_share * USAGE_WEIGHT;
    if inputs.at_rate_limit {
        s -= RATE_LIMIT_PENALTY;
    }
    if inputs.in_cooldown {
        s -= COOLDOWN_PENALTY;
    }
    s
}
