use mercato_core::{Cell, DataKind, DataResponse, DataTable, columns};
use mercato_fusion::{FusionConfig, FusionEngine, FusionStrategy};

fn bar_response(provider: &str, rows: &[(&str, &str, f64, i64)]) -> DataResponse {
    let mut t = DataTable::new([columns::SYMBOL, columns::DATE, columns::CLOSE, columns::VOLUME]);
    for (sym, date, close, volume) in rows {
        t.push_row(vec![
            Cell::Text((*sym).into()),
            Cell::Text((*date).into()),
            Cell::Float(*close),
            Cell::Int(*volume),
        ]);
    }
    DataResponse::ok(provider, DataKind::DailyBar, t)
}

fn close_at(resp: &DataResponse, row: usize) -> f64 {
    resp.table
        .cell(row, columns::CLOSE)
        .and_then(Cell::as_f64)
        .unwrap()
}

#[test]
fn zero_candidates_fail() {
    let engine = FusionEngine::default();
    let out = engine.fuse(DataKind::DailyBar, vec![], FusionStrategy::QualityBased);
    assert!(!out.success);
}

#[test]
fn single_candidate_passes_through() {
    let engine = FusionEngine::default();
    let only = bar_response("alpha", &[("AAPL", "2024-01-02", 185.0, 1000)]);
    let out = engine.fuse(
        DataKind::DailyBar,
        vec![only.clone()],
        FusionStrategy::QualityBased,
    );
    assert_eq!(out.table, only.table);
    assert_eq!(out.provider, "alpha");
    assert_eq!(out.meta.source_count, 1);
}

#[test]
fn failed_candidates_are_dropped_before_fusing() {
    let engine = FusionEngine::default();
    let good = bar_response("alpha", &[("AAPL", "2024-01-02", 185.0, 1000)]);
    let bad = DataResponse::failed("beta", DataKind::DailyBar, "network down");
    let out = engine.fuse(DataKind::DailyBar, vec![bad, good], FusionStrategy::QualityBased);
    assert!(out.success);
    assert_eq!(out.provider, "alpha");
}

#[test]
fn weighted_average_is_order_invariant() {
    let engine = FusionEngine::default();
    let a = bar_response(
        "alpha",
        &[("AAPL", "2024-01-02", 100.0, 1000), ("AAPL", "2024-01-03", 102.0, 1100)],
    );
    let b = bar_response(
        "beta",
        &[("AAPL", "2024-01-02", 101.0, 900), ("AAPL", "2024-01-04", 103.0, 1200)],
    );

    let forward = engine.fuse(
        DataKind::DailyBar,
        vec![a.clone(), b.clone()],
        FusionStrategy::WeightedAverage,
    );
    let reverse = engine.fuse(DataKind::DailyBar, vec![b, a], FusionStrategy::WeightedAverage);
    assert_eq!(forward.table, reverse.table);

    // union of row keys, sorted by (symbol, date)
    assert_eq!(forward.table.row_count(), 3);
    assert!((close_at(&forward, 0) - 100.5).abs() < 1e-9);
    // rows present in only one candidate keep that candidate's value
    assert!((close_at(&forward, 1) - 102.0).abs() < 1e-9);
    assert!((close_at(&forward, 2) - 103.0).abs() < 1e-9);
}

#[test]
fn median_is_order_invariant() {
    let engine = FusionEngine::default();
    let a = bar_response("alpha", &[("AAPL", "2024-01-02", 100.0, 1000)]);
    let b = bar_response("beta", &[("AAPL", "2024-01-02", 104.0, 1000)]);
    let c = bar_response("gamma", &[("AAPL", "2024-01-02", 101.0, 1000)]);

    let forward = engine.fuse(
        DataKind::DailyBar,
        vec![a.clone(), b.clone(), c.clone()],
        FusionStrategy::Median,
    );
    let reverse = engine.fuse(DataKind::DailyBar, vec![c, b, a], FusionStrategy::Median);
    assert_eq!(forward.table, reverse.table);
    assert!((close_at(&forward, 0) - 101.0).abs() < 1e-9);
}

#[test]
fn quality_weighted_fusion_lands_between_disagreeing_sources() {
    // Two sources 3% apart on the same close: beyond the 1% tolerance, so
    // both lose consistency, and the fused value sits strictly between them.
    let engine = FusionEngine::default();
    let a = bar_response("alpha", &[("AAPL", "2024-01-02", 100.0, 1000)]);
    let b = bar_response("beta", &[("AAPL", "2024-01-02", 103.0, 1000)]);

    let metrics = engine.assess_all(&[a.clone(), b.clone()]);
    assert!(metrics.iter().all(|m| m.consistency < 1.0));

    let out = engine.fuse(DataKind::DailyBar, vec![a, b], FusionStrategy::QualityBased);
    let fused = close_at(&out, 0);
    assert!(fused > 100.0 && fused < 103.0);
    assert_eq!(out.meta.source_count, 2);
}

#[test]
fn consensus_tie_breaks_on_provider_name() {
    let engine = FusionEngine::default();
    // identical payloads, so identical scores
    let rows = [("AAPL", "2024-01-02", 185.0, 1000)];
    let a = bar_response("zeta", &rows);
    let b = bar_response("alpha", &rows);
    let out = engine.fuse(DataKind::DailyBar, vec![a, b], FusionStrategy::Consensus);
    assert_eq!(out.provider, "alpha");
}

#[test]
fn int_columns_survive_agreeing_merge() {
    let engine = FusionEngine::default();
    let a = bar_response("alpha", &[("AAPL", "2024-01-02", 100.0, 500)]);
    let b = bar_response("beta", &[("AAPL", "2024-01-02", 100.0, 500)]);
    let out = engine.fuse(DataKind::DailyBar, vec![a, b], FusionStrategy::WeightedAverage);
    assert_eq!(
        out.table.cell(0, columns::VOLUME),
        Some(&Cell::Int(500))
    );
}

mod order_invariance {
    use super::*;
    use proptest::prelude::*;

    fn candidate_strategy() -> impl Strategy<Value = Vec<(String, String, f64)>> {
        prop::collection::vec(
            (
                prop::sample::select(vec!["AAPL", "MSFT", "NVDA"]),
                prop::sample::select(vec!["2024-01-02", "2024-01-03", "2024-01-04"]),
                1.0f64..500.0,
            ),
            1..6,
        )
        .prop_map(|rows| {
            rows.into_iter()
                .map(|(s, d, c)| (s.to_owned(), d.to_owned(), c))
                .collect()
        })
    }

    fn to_response(provider: &str, rows: &[(String, String, f64)]) -> DataResponse {
        let mut t = DataTable::new([columns::SYMBOL, columns::DATE, columns::CLOSE]);
        for (sym, date, close) in rows {
            t.push_row(vec![
                Cell::Text(sym.clone()),
                Cell::Text(date.clone()),
                Cell::Float(*close),
            ]);
        }
        DataResponse::ok(provider, DataKind::DailyBar, t)
    }

    proptest! {
        #[test]
        fn weighted_average_ignores_candidate_order(
            a in candidate_strategy(),
            b in candidate_strategy(),
            c in candidate_strategy(),
        ) {
            let engine = FusionEngine::default();
            let (ra, rb, rc) = (
                to_response("alpha", &a),
                to_response("beta", &b),
                to_response("gamma", &c),
            );
            let forward = engine.fuse(
                DataKind::DailyBar,
                vec![ra.clone(), rb.clone(), rc.clone()],
                FusionStrategy::WeightedAverage,
            );
            let reverse = engine.fuse(
                DataKind::DailyBar,
                vec![rc, rb, ra],
                FusionStrategy::WeightedAverage,
            );
            prop_assert_eq!(forward.table, reverse.table);
        }

        #[test]
        fn median_ignores_candidate_order(
            a in candidate_strategy(),
            b in candidate_strategy(),
            c in candidate_strategy(),
        ) {
            let engine = FusionEngine::default();
            let (ra, rb, rc) = (
                to_response("alpha", &a),
                to_response("beta", &b),
                to_response("gamma", &c),
            );
            let forward = engine.fuse(
                DataKind::DailyBar,
                vec![ra.clone(), rb.clone(), rc.clone()],
                FusionStrategy::Median,
            );
            let reverse = engine.fuse(
                DataKind::DailyBar,
                vec![rb, rc, ra],
                FusionStrategy::Median,
            );
            prop_assert_eq!(forward.table, reverse.table);
        }
    }
}
