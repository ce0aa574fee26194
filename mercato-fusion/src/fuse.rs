use std::collections::{BTreeSet, HashMap};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::debug;

use mercato_core::{Cell, DataKind, DataResponse, DataTable};

use crate::FusionConfig;
use crate::quality::QualityMetrics;

/// How candidates are combined into a single payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[non_exhaustive]
pub enum FusionStrategy {
    /// First candidate carrying data wins, in the order given.
    FirstSuccess,
    /// Cell-wise mean with equal weight per candidate.
    WeightedAverage,
    /// Cell-wise median across candidates.
    Median,
    /// The single candidate with the best overall quality wins.
    Consensus,
    /// First candidate in the order given (callers pass priority order).
    PriorityBased,
    /// Cell-wise mean weighted by each candidate's overall quality score.
    #[default]
    QualityBased,
}

/// Combines candidate responses for the same request into one.
///
/// Callers pass candidates in a deterministic order (the orchestrator uses
/// score-descending with a name tie-break); row-keyed strategies are
/// additionally invariant to that order.
#[derive(Debug, Clone, Default)]
pub struct FusionEngine {
    cfg: FusionConfig,
}

impl FusionEngine {
    /// Engine with the given tunables.
    #[must_use]
    pub const fn new(cfg: FusionConfig) -> Self {
        Self { cfg }
    }

    /// The active tunables.
    #[must_use]
    pub const fn config(&self) -> &FusionConfig {
        &self.cfg
    }

    /// Score every candidate against its siblings.
    #[must_use]
    pub fn assess_all(&self, candidates: &[DataResponse]) -> Vec<QualityMetrics> {
        let now = Utc::now();
        (0..candidates.len())
            .map(|i| {
                let siblings: Vec<&DataResponse> = candidates
                    .iter()
                    .enumerate()
                    .filter(|(j, _)| *j != i)
                    .map(|(_, c)| c)
                    .collect();
                QualityMetrics::assess(&self.cfg, &candidates[i], &siblings, now)
            })
            .collect()
    }

    /// Fuse `candidates` into a single response.
    ///
    /// Candidates without data are dropped first. Zero usable candidates
    /// produce a failed response; exactly one is passed through untouched.
    #[must_use]
    pub fn fuse(
        &self,
        kind: DataKind,
        candidates: Vec<DataResponse>,
        strategy: FusionStrategy,
    ) -> DataResponse {
        let mut usable: Vec<DataResponse> =
            candidates.into_iter().filter(DataResponse::has_data).collect();
        if usable.is_empty() {
            return DataResponse::failed("merged", kind, "no successful candidates to fuse");
        }
        if usable.len() == 1 {
            let mut only = usable.remove(0);
            only.meta.source_count = 1;
            return only;
        }

        let metrics = self.assess_all(&usable);
        debug!(
            kind = %kind,
            strategy = ?strategy,
            candidates = usable.len(),
            scores = ?metrics.iter().map(|m| m.overall).collect::<Vec<_>>(),
            "fusing candidates"
        );

        match strategy {
            FusionStrategy::FirstSuccess | FusionStrategy::PriorityBased => {
                let mut first = usable.remove(0);
                first.meta.source_count = 1;
                first
            }
            FusionStrategy::Consensus => pick_consensus(usable, &metrics),
            FusionStrategy::WeightedAverage => {
                let weights = vec![1.0; usable.len()];
                merge_rows(kind, &usable, &weights, Aggregation::WeightedMean)
            }
            FusionStrategy::QualityBased => {
                let weights: Vec<f64> = metrics.iter().map(|m| m.overall).collect();
                merge_rows(kind, &usable, &weights, Aggregation::WeightedMean)
            }
            FusionStrategy::Median => {
                let weights = vec![1.0; usable.len()];
                merge_rows(kind, &usable, &weights, Aggregation::Median)
            }
        }
    }
}

fn pick_consensus(mut candidates: Vec<DataResponse>, metrics: &[QualityMetrics]) -> DataResponse {
    // Highest overall score; equal scores fall back to provider name so the
    // winner does not depend on input order.
    let mut best: Option<(usize, f64)> = None;
    for (i, m) in metrics.iter().enumerate() {
        let better = match best {
            None => true,
            Some((bi, bs)) => {
                m.overall > bs
                    || (m.overall == bs && candidates[i].provider < candidates[bi].provider)
            }
        };
        if better {
            best = Some((i, m.overall));
        }
    }
    let idx = best.map_or(0, |(i, _)| i);
    let total = candidates.len();
    let mut winner = candidates.swap_remove(idx);
    winner.meta.source_count = total;
    winner
}

#[derive(Clone, Copy)]
enum Aggregation {
    WeightedMean,
    Median,
}

/// Merge candidates over the union of their `(symbol, date)` row keys.
///
/// Keys are emitted in sorted order and each cell is aggregated over the
/// candidates that actually have the row, with weights renormalized per cell.
fn merge_rows(
    kind: DataKind,
    candidates: &[DataResponse],
    weights: &[f64],
    aggregation: Aggregation,
) -> DataResponse {
    // Column union preserving first-seen order.
    let mut columns: Vec<String> = Vec::new();
    for c in candidates {
        for col in &c.table.columns {
            if !columns.contains(col) {
                columns.push(col.clone());
            }
        }
    }

    // Row-key union, plus a key -> row-index map per candidate.
    let mut keys: BTreeSet<(String, String)> = BTreeSet::new();
    let mut index: Vec<HashMap<(String, String), usize>> = Vec::with_capacity(candidates.len());
    for c in candidates {
        let mut map = HashMap::new();
        for row in 0..c.table.row_count() {
            let key = c.table.row_key(row);
            keys.insert(key.clone());
            // First occurrence wins on duplicate keys within one candidate.
            map.entry(key).or_insert(row);
        }
        index.push(map);
    }

    let mut table = DataTable::new(columns.clone());
    for key in &keys {
        let mut row = Vec::with_capacity(columns.len());
        for col in &columns {
            row.push(aggregate_cell(candidates, weights, &index, key, col, aggregation));
        }
        table.push_row(row);
    }

    DataResponse::merged(kind, table, candidates.len())
}

fn aggregate_cell(
    candidates: &[DataResponse],
    weights: &[f64],
    index: &[HashMap<(String, String), usize>],
    key: &(String, String),
    col: &str,
    aggregation: Aggregation,
) -> Cell {
    let mut numeric: Vec<(f64, f64)> = Vec::new();
    let mut all_int = true;
    for (i, c) in candidates.iter().enumerate() {
        let Some(&row) = index[i].get(key) else {
            continue;
        };
        let Some(cell) = c.table.cell(row, col) else {
            continue;
        };
        if let Some(v) = cell.as_f64() {
            if !matches!(cell, Cell::Int(_)) {
                all_int = false;
            }
            numeric.push((v, weights[i]));
        }
    }

    if !numeric.is_empty() {
        // Sum in a canonical order so float rounding is identical no matter
        // which candidate arrived first.
        numeric.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.total_cmp(&b.1)));
        let value = match aggregation {
            Aggregation::WeightedMean => weighted_mean(&numeric),
            Aggregation::Median => median(&mut numeric),
        };
        return if all_int && value.fract() == 0.0 {
            #[allow(clippy::cast_possible_truncation)]
            Cell::Int(value as i64)
        } else {
            Cell::Float(value)
        };
    }

    // Non-numeric: take the heaviest contributor that has the cell.
    let mut best: Option<(f64, &Cell)> = None;
    for (i, c) in candidates.iter().enumerate() {
        let Some(&row) = index[i].get(key) else {
            continue;
        };
        if let Some(cell) = c.table.cell(row, col)
            && !cell.is_null()
            && best.is_none_or(|(w, _)| weights[i] > w)
        {
            best = Some((weights[i], cell));
        }
    }
    best.map_or(Cell::Null, |(_, cell)| cell.clone())
}

fn weighted_mean(values: &[(f64, f64)]) -> f64 {
    let total: f64 = values.iter().map(|(_, w)| w).sum();
    if total > 0.0 {
        values.iter().map(|(v, w)| v * w).sum::<f64>() / total
    } else {
        #[allow(clippy::cast_precision_loss)]
        let n = values.len() as f64;
        values.iter().map(|(v, _)| v).sum::<f64>() / n
    }
}

fn median(values: &mut [(f64, f64)]) -> f64 {
    values.sort_by(|a, b| a.0.total_cmp(&b.0));
    let n = values.len();
    if n % 2 == 1 {
        values[n / 2].0
    } else {
        f64::midpoint(values[n / 2 - 1].0, values[n / 2].0)
    }
}
