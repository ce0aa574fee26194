use std::sync::Arc;

use async_trait::async_trait;
use mercato::{
    AdapterConfig, AdapterStatus, Cell, DataKind, DataRequest, DataResponse, MercatoError,
    Orchestrator, ProviderAdapter, RetrievalStrategy, columns,
};
use mercato_mock::MockAdapter;

struct BrokenAdapter {
    name: &'static str,
}

#[async_trait]
impl ProviderAdapter for BrokenAdapter {
    fn name(&self) -> &'static str {
        self.name
    }
    fn supported_kinds(&self) -> &'static [DataKind] {
        DataKind::all()
    }
    async fn check_availability(&self) -> AdapterStatus {
        AdapterStatus::Available
    }
    async fn fetch(&self, _request: &DataRequest) -> Result<DataResponse, MercatoError> {
        Err(MercatoError::network(self.name, "connection refused"))
    }
}

fn daily_request(symbol: &str) -> DataRequest {
    DataRequest::builder(DataKind::DailyBar)
        .symbol(symbol)
        .build()
        .unwrap()
}

fn first_close(resp: &DataResponse) -> f64 {
    resp.table
        .cell(0, columns::CLOSE)
        .and_then(Cell::as_f64)
        .unwrap()
}

#[tokio::test]
async fn parallel_merge_fuses_disagreeing_adapters() {
    // same fixture, shifted by +2.0 on one side
    let orchestrator = Orchestrator::builder()
        .with_adapter(
            Arc::new(MockAdapter::named("alpha")),
            AdapterConfig::with_priority(1),
        )
        .with_adapter(
            Arc::new(MockAdapter::named("beta").with_close_offset(2.0)),
            AdapterConfig::with_priority(2),
        )
        .build()
        .await
        .unwrap();

    let base = MockAdapter::named("alpha")
        .fetch(&daily_request("AAPL"))
        .await
        .unwrap();
    let low = first_close(&base);

    let resp = orchestrator
        .get_with(&daily_request("AAPL"), RetrievalStrategy::ParallelMerge)
        .await
        .unwrap();
    assert!(resp.success);
    assert_eq!(resp.provider, "merged");
    assert_eq!(resp.meta.source_count, 2);
    assert!(resp.meta.validation_passed);

    let fused = first_close(&resp);
    assert!(fused > low && fused < low + 2.0);
}

#[tokio::test]
async fn parallel_merge_survives_partial_failure() {
    let orchestrator = Orchestrator::builder()
        .with_adapter(
            Arc::new(BrokenAdapter { name: "alpha" }),
            AdapterConfig::with_priority(1),
        )
        .with_adapter(
            Arc::new(MockAdapter::named("beta")),
            AdapterConfig::with_priority(2),
        )
        .build()
        .await
        .unwrap();

    let resp = orchestrator
        .get_with(&daily_request("AAPL"), RetrievalStrategy::ParallelMerge)
        .await
        .unwrap();
    assert!(resp.success);
    assert_eq!(resp.provider, "beta");
    assert_eq!(resp.meta.failed_adapters.len(), 1);
    assert!(resp.meta.failed_adapters[0].contains("alpha"));
}

#[tokio::test]
async fn parallel_merge_with_all_failures_reports_them() {
    let orchestrator = Orchestrator::builder()
        .with_adapter(
            Arc::new(BrokenAdapter { name: "alpha" }),
            AdapterConfig::with_priority(1),
        )
        .with_adapter(
            Arc::new(BrokenAdapter { name: "beta" }),
            AdapterConfig::with_priority(2),
        )
        .build()
        .await
        .unwrap();

    let resp = orchestrator
        .get_with(&daily_request("AAPL"), RetrievalStrategy::ParallelMerge)
        .await
        .unwrap();
    assert!(!resp.success);
    let msg = resp.error.unwrap();
    assert!(msg.contains("alpha") && msg.contains("beta"));
}

#[tokio::test]
async fn cross_validate_returns_first_when_sources_agree() {
    let orchestrator = Orchestrator::builder()
        .with_adapter(
            Arc::new(MockAdapter::named("alpha")),
            AdapterConfig::with_priority(1),
        )
        .with_adapter(
            Arc::new(MockAdapter::named("beta")),
            AdapterConfig::with_priority(2),
        )
        .build()
        .await
        .unwrap();

    let resp = orchestrator
        .get_with(&daily_request("AAPL"), RetrievalStrategy::CrossValidate)
        .await
        .unwrap();
    assert!(resp.success);
    assert_eq!(resp.provider, "alpha");
    assert!(resp.meta.validation_issues.is_empty());
}

#[tokio::test]
async fn cross_validate_flags_unresolvable_disagreement() {
    // ~15% apart on a ~136 base: far beyond the 1% tolerance, and no third
    // adapter to arbitrate
    let orchestrator = Orchestrator::builder()
        .with_adapter(
            Arc::new(MockAdapter::named("alpha")),
            AdapterConfig::with_priority(1),
        )
        .with_adapter(
            Arc::new(MockAdapter::named("beta").with_close_offset(20.0)),
            AdapterConfig::with_priority(2),
        )
        .build()
        .await
        .unwrap();

    let resp = orchestrator
        .get_with(&daily_request("AAPL"), RetrievalStrategy::CrossValidate)
        .await
        .unwrap();
    assert!(resp.success);
    assert_eq!(resp.provider, "alpha");
    assert!(!resp.meta.validation_passed);
    assert!(!resp.meta.validation_issues.is_empty());
}

#[tokio::test]
async fn cross_validate_falls_back_to_a_third_adapter() {
    let orchestrator = Orchestrator::builder()
        .with_adapter(
            Arc::new(MockAdapter::named("alpha")),
            AdapterConfig::with_priority(1),
        )
        .with_adapter(
            Arc::new(MockAdapter::named("beta").with_close_offset(20.0)),
            AdapterConfig::with_priority(2),
        )
        .with_adapter(
            Arc::new(MockAdapter::named("gamma")),
            AdapterConfig::with_priority(3),
        )
        .build()
        .await
        .unwrap();

    let resp = orchestrator
        .get_with(&daily_request("AAPL"), RetrievalStrategy::CrossValidate)
        .await
        .unwrap();
    assert!(resp.success);
    assert_eq!(resp.provider, "gamma");
    assert!(!resp.meta.validation_issues.is_empty());
}

#[tokio::test]
async fn cross_validate_with_one_adapter_degrades_to_failover() {
    let orchestrator = Orchestrator::builder()
        .with_adapter(
            Arc::new(MockAdapter::named("alpha")),
            AdapterConfig::with_priority(1),
        )
        .build()
        .await
        .unwrap();

    let resp = orchestrator
        .get_with(&daily_request("AAPL"), RetrievalStrategy::CrossValidate)
        .await
        .unwrap();
    assert!(resp.success);
    assert_eq!(resp.provider, "alpha");
}
