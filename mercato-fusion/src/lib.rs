//! mercato-fusion
//!
//! Combines overlapping [`DataResponse`](mercato_core::DataResponse) payloads
//! from several adapters into one table, scoring each candidate on four
//! quality dimensions and weighting its contribution accordingly.
//!
//! Fusion output is deterministic: rows are keyed by `(symbol, date)` and
//! emitted in sorted key order, so the arrival order of candidates never
//! changes the produced bytes.
#![warn(missing_docs)]

/// The fusion engine and its strategies.
pub mod fuse;
/// Quality dimension scoring.
pub mod quality;
/// Post-fusion output validation.
pub mod validate;

pub use fuse::{FusionEngine, FusionStrategy};
pub use quality::QualityMetrics;
pub use validate::{ValidationLevel, validate_table};

use serde::{Deserialize, Serialize};

/// Tunables of the quality model and the fusion strategies.
///
/// The defaults are the calibration the system ships with; deployments that
/// aggregate noisier sources loosen `consistency_tolerance` instead of
/// patching the scoring code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FusionConfig {
    /// Relative difference below which two close prices count as agreeing.
    pub consistency_tolerance: f64,
    /// Weight of the completeness dimension in the overall score.
    pub weight_completeness: f64,
    /// Weight of the consistency dimension in the overall score.
    pub weight_consistency: f64,
    /// Weight of the accuracy dimension in the overall score.
    pub weight_accuracy: f64,
    /// Weight of the timeliness dimension in the overall score.
    pub weight_timeliness: f64,
    /// Accuracy penalty for a non-positive price cell.
    pub penalty_nonpositive_price: f64,
    /// Accuracy penalty for an implausibly large percent change.
    pub penalty_extreme_change: f64,
    /// Accuracy penalty for a negative volume cell.
    pub penalty_negative_volume: f64,
    /// Absolute percent-change magnitude considered implausible.
    pub extreme_change_threshold: f64,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            consistency_tolerance: 0.01,
            weight_completeness: 0.3,
            weight_consistency: 0.3,
            weight_accuracy: 0.3,
            weight_timeliness: 0.1,
            penalty_nonpositive_price: 0.3,
            penalty_extreme_change: 0.2,
            penalty_negative_volume: 0.2,
            extreme_change_threshold: 50.0,
        }
    }
}
