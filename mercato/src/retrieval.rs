//! The three retrieval strategies.
//!
//! All of them operate on the pre-computed selection order from
//! `select_ranked` and express provider-side failure as a `DataResponse`
//! with `success == false`; only the orchestrator's entry points turn
//! request-shape problems into `Err`.

use futures::stream::{FuturesUnordered, StreamExt};
use tracing::{debug, warn};

use mercato_core::{Cell, DataRequest, DataResponse, DataTable, columns};
use mercato_fusion::{FusionStrategy, ValidationLevel, validate_table};

use crate::core::Orchestrator;

impl Orchestrator {
    /// Sequential failover in score order; first success with rows wins.
    ///
    /// An empty-but-successful answer is remembered and returned only when
    /// no later adapter produces rows, so "no data exists" never masks data
    /// a lower-ranked adapter does have.
    pub(crate) async fn first_success(
        &self,
        request: &DataRequest,
        ranked: &[usize],
    ) -> DataResponse {
        let mut notes: Vec<String> = Vec::new();
        let mut empty_fallback: Option<DataResponse> = None;

        for &idx in ranked {
            let name = self.adapters[idx].adapter.name();
            match self.attempt(idx, request).await {
                Ok(resp) if resp.has_data() => {
                    let mut resp = resp;
                    resp.meta.failed_adapters = notes;
                    return resp;
                }
                Ok(resp) if resp.success => {
                    debug!(adapter = name, "empty success, trying next adapter");
                    empty_fallback.get_or_insert(resp);
                }
                Ok(resp) => {
                    let msg = resp
                        .error
                        .unwrap_or_else(|| "unspecified failure".to_owned());
                    notes.push(format!("{name}: {msg}"));
                }
                Err(e) => {
                    debug!(adapter = name, error = %e, "adapter attempt failed");
                    notes.push(format!("{name}: {e}"));
                }
            }
        }

        if let Some(mut empty) = empty_fallback {
            empty.meta.failed_adapters = notes;
            return empty;
        }

        let mut resp = DataResponse::failed(
            "orchestrator",
            request.kind,
            format!("all adapters failed: {}", notes.join("; ")),
        );
        resp.meta.failed_adapters = notes;
        resp
    }

    /// Concurrent fan-out to the top-scored adapters, fused on completion.
    ///
    /// Individual failures land in the response metadata instead of failing
    /// the request; the request fails only when nobody returns rows.
    pub(crate) async fn parallel_merge(
        &self,
        request: &DataRequest,
        ranked: &[usize],
    ) -> DataResponse {
        let fanout = self.cfg.parallel_fanout.clamp(1, ranked.len());
        let top = &ranked[..fanout];

        let mut futs = FuturesUnordered::new();
        for (pos, &idx) in top.iter().enumerate() {
            futs.push(async move { (pos, idx, self.attempt(idx, request).await) });
        }

        // Completion order is nondeterministic; slot results by rank so the
        // fusion engine always sees candidates in the same order.
        let mut slots: Vec<Option<DataResponse>> = (0..fanout).map(|_| None).collect();
        let mut notes: Vec<String> = Vec::new();
        while let Some((pos, idx, res)) = futs.next().await {
            match res {
                Ok(resp) if resp.has_data() => slots[pos] = Some(resp),
                Ok(_) => debug!(
                    adapter = self.adapters[idx].adapter.name(),
                    "empty success, excluded from fusion"
                ),
                Err(e) => notes.push(format!("{}: {e}", self.adapters[idx].adapter.name())),
            }
        }

        let candidates: Vec<DataResponse> = slots.into_iter().flatten().collect();
        if candidates.is_empty() {
            let mut resp = DataResponse::failed(
                "orchestrator",
                request.kind,
                format!("all adapters failed: {}", notes.join("; ")),
            );
            resp.meta.failed_adapters = notes;
            return resp;
        }

        let mut fused = self
            .fusion
            .fuse(request.kind, candidates, FusionStrategy::QualityBased);
        let issues = validate_table(&fused.table, ValidationLevel::Basic);
        fused.meta.validation_passed = issues.is_empty();
        fused.meta.validation_issues = issues;
        fused.meta.failed_adapters = notes;
        fused
    }

    /// Fetch from the top two adapters and require agreement.
    ///
    /// On disagreement the remaining ranking is consulted via
    /// [`first_success`](Self::first_success); with nothing left, the
    /// top-ranked answer is returned carrying a validation issue.
    pub(crate) async fn cross_validate(
        &self,
        request: &DataRequest,
        ranked: &[usize],
    ) -> DataResponse {
        if ranked.len() < 2 {
            return self.first_success(request, ranked).await;
        }

        let mut notes: Vec<String> = Vec::new();
        let mut fetch = async |idx: usize| match self.attempt(idx, request).await {
            Ok(resp) if resp.has_data() => Some(resp),
            Ok(_) => None,
            Err(e) => {
                notes.push(format!("{}: {e}", self.adapters[idx].adapter.name()));
                None
            }
        };
        let first = fetch(ranked[0]).await;
        let second = fetch(ranked[1]).await;

        match (first, second) {
            (Some(mut a), Some(b)) => {
                if tables_agree(&a.table, &b.table, self.cfg.cross_validate_tolerance) {
                    debug!(first = a.provider, second = b.provider, "cross-validation agreed");
                    a.meta.failed_adapters = notes;
                    return a;
                }
                warn!(
                    first = a.provider,
                    second = b.provider,
                    "cross-validation disagreement"
                );
                let rest = &ranked[2..];
                if rest.is_empty() {
                    a.meta.validation_passed = false;
                    a.meta
                        .validation_issues
                        .push(format!("disagrees with {} beyond tolerance", b.provider));
                    a.meta.failed_adapters = notes;
                    return a;
                }
                let mut resp = self.first_success(request, rest).await;
                resp.meta
                    .validation_issues
                    .push(format!("{} and {} disagreed beyond tolerance", a.provider, b.provider));
                resp
            }
            (Some(mut only), None) | (None, Some(mut only)) => {
                only.meta.failed_adapters = notes;
                only
            }
            (None, None) => {
                let mut resp = DataResponse::failed(
                    "orchestrator",
                    request.kind,
                    format!("all adapters failed: {}", notes.join("; ")),
                );
                resp.meta.failed_adapters = notes;
                resp
            }
        }
    }
}

/// Two tables agree when they have the same number of rows and the mean
/// relative difference of close values over overlapping rows stays within
/// `tolerance`. Tables without comparable close values agree by default.
fn tables_agree(a: &DataTable, b: &DataTable, tolerance: f64) -> bool {
    if a.row_count() != b.row_count() {
        return false;
    }
    let closes = |t: &DataTable| -> Vec<((String, String), f64)> {
        (0..t.row_count())
            .filter_map(|row| {
                t.cell(row, columns::CLOSE)
                    .and_then(Cell::as_f64)
                    .map(|v| (t.row_key(row), v))
            })
            .collect()
    };
    let ours = closes(a);
    let theirs = closes(b);

    let mut diffs: Vec<f64> = Vec::new();
    for (key, va) in &ours {
        if let Some(vb) = theirs.iter().find(|(k, _)| k == key).map(|(_, v)| *v) {
            let scale = va.abs().max(vb.abs());
            if scale > 0.0 {
                diffs.push((va - vb).abs() / scale);
            }
        }
    }
    if diffs.is_empty() {
        return true;
    }
    #[allow(clippy::cast_precision_loss)]
    let mean = diffs.iter().sum::<f64>() / diffs.len() as f64;
    mean <= tolerance
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(rows: &[(&str, &str, f64)]) -> DataTable {
        let mut t = DataTable::new([columns::SYMBOL, columns::DATE, columns::CLOSE]);
        for (sym, date, close) in rows {
            t.push_row(vec![
                Cell::Text((*sym).into()),
                Cell::Text((*date).into()),
                Cell::Float(*close),
            ]);
        }
        t
    }

    #[test]
    fn identical_tables_agree() {
        let a = table(&[("AAPL", "2024-01-02", 100.0)]);
        assert!(tables_agree(&a, &a.clone(), 0.01));
    }

    #[test]
    fn three_percent_difference_breaks_one_percent_tolerance() {
        let a = table(&[("AAPL", "2024-01-02", 100.0)]);
        let b = table(&[("AAPL", "2024-01-02", 103.0)]);
        assert!(!tables_agree(&a, &b, 0.01));
        assert!(tables_agree(&a, &b, 0.05));
    }

    #[test]
    fn differing_row_counts_disagree() {
        let a = table(&[("AAPL", "2024-01-02", 100.0)]);
        let b = table(&[("AAPL", "2024-01-02", 100.0), ("AAPL", "2024-01-03", 101.0)]);
        assert!(!tables_agree(&a, &b, 0.01));
    }
}
