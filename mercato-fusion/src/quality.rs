use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use mercato_core::{Cell, DataResponse, DataTable, columns};

use crate::FusionConfig;

/// Scores for one candidate payload, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityMetrics {
    /// Fraction of non-missing cells.
    pub completeness: f64,
    /// Agreement with sibling candidates on overlapping rows.
    pub consistency: f64,
    /// Plausibility of the values themselves.
    pub accuracy: f64,
    /// Freshness of the retrieval.
    pub timeliness: f64,
    /// Weighted combination of the four dimensions.
    pub overall: f64,
}

impl QualityMetrics {
    /// Score `candidate` against its `siblings` (the other candidates for the
    /// same request) as of `now`.
    #[must_use]
    pub fn assess(
        cfg: &FusionConfig,
        candidate: &DataResponse,
        siblings: &[&DataResponse],
        now: DateTime<Utc>,
    ) -> Self {
        let completeness = completeness(&candidate.table);
        let consistency = consistency(cfg, &candidate.table, siblings);
        let accuracy = accuracy(cfg, &candidate.table);
        let timeliness = timeliness(candidate.fetched_at, now);
        let overall = (cfg.weight_completeness * completeness
            + cfg.weight_consistency * consistency
            + cfg.weight_accuracy * accuracy
            + cfg.weight_timeliness * timeliness)
            .clamp(0.0, 1.0);
        Self {
            completeness,
            consistency,
            accuracy,
            timeliness,
            overall,
        }
    }
}

/// Fraction of cells that are present. An empty table scores 0.
#[must_use]
pub fn completeness(table: &DataTable) -> f64 {
    let total = table.cell_count();
    if total == 0 {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let ratio = (total - table.missing_count()) as f64 / total as f64;
    ratio
}

/// Mean agreement with each sibling over overlapping `(symbol, date)` rows.
///
/// Two rows agree when their `close` values differ by less than the relative
/// tolerance. Candidates with no siblings or no overlap score 1.0; absent
/// close values on either side are skipped.
#[must_use]
pub fn consistency(cfg: &FusionConfig, table: &DataTable, siblings: &[&DataResponse]) -> f64 {
    if siblings.is_empty() || table.is_empty() {
        return 1.0;
    }
    let own = close_by_key(table);
    let mut per_sibling = Vec::new();
    for sibling in siblings {
        let theirs = close_by_key(&sibling.table);
        let mut compared = 0usize;
        let mut agreeing = 0usize;
        for (key, a) in &own {
            if let Some(b) = theirs.iter().find(|(k, _)| k == key).map(|(_, v)| *v) {
                compared += 1;
                if agrees(*a, b, cfg.consistency_tolerance) {
                    agreeing += 1;
                }
            }
        }
        if compared > 0 {
            #[allow(clippy::cast_precision_loss)]
            per_sibling.push(agreeing as f64 / compared as f64);
        }
    }
    if per_sibling.is_empty() {
        return 1.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let mean = per_sibling.iter().sum::<f64>() / per_sibling.len() as f64;
    mean
}

/// Relative agreement against the larger magnitude of the pair.
fn agrees(a: f64, b: f64, tolerance: f64) -> bool {
    let scale = a.abs().max(b.abs());
    if scale == 0.0 {
        return true;
    }
    (a - b).abs() / scale < tolerance
}

fn close_by_key(table: &DataTable) -> Vec<((String, String), f64)> {
    let mut out = Vec::new();
    if table.column_index(columns::CLOSE).is_none() {
        return out;
    }
    for row in 0..table.row_count() {
        if let Some(v) = table.cell(row, columns::CLOSE).and_then(Cell::as_f64) {
            out.push((table.row_key(row), v));
        }
    }
    out
}

/// Start from 1.0 and subtract a penalty per implausibility class observed.
///
/// Each class penalizes at most once regardless of how many rows trip it.
#[must_use]
pub fn accuracy(cfg: &FusionConfig, table: &DataTable) -> f64 {
    let mut score: f64 = 1.0;
    if has_violation(table, &[columns::OPEN, columns::HIGH, columns::LOW, columns::CLOSE], |v| {
        v <= 0.0
    }) {
        score -= cfg.penalty_nonpositive_price;
    }
    if has_violation(table, &[columns::PCT_CHANGE], |v| {
        v.abs() > cfg.extreme_change_threshold
    }) {
        score -= cfg.penalty_extreme_change;
    }
    if has_violation(table, &[columns::VOLUME], |v| v < 0.0) {
        score -= cfg.penalty_negative_volume;
    }
    score.max(0.0)
}

fn has_violation(table: &DataTable, cols: &[&str], pred: impl Fn(f64) -> bool) -> bool {
    cols.iter().any(|col| {
        table.column_index(col).is_some()
            && (0..table.row_count()).any(|row| {
                table
                    .cell(row, col)
                    .and_then(Cell::as_f64)
                    .is_some_and(&pred)
            })
    })
}

/// Step function of the payload's age.
#[must_use]
pub fn timeliness(fetched_at: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let age = (now - fetched_at).num_seconds().max(0);
    match age {
        0..=300 => 1.0,
        301..=3600 => 0.8,
        3601..=86400 => 0.6,
        _ => 0.3,
    }
}
