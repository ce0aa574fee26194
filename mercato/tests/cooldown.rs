use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use mercato::{
    AdapterConfig, AdapterStatus, DataKind, DataRequest, DataResponse, MercatoError, Orchestrator,
    ProviderAdapter,
};
use mercato_mock::MockAdapter;

/// Counts calls and fails every one of them with a network error.
struct FlakyAdapter {
    name: &'static str,
    calls: AtomicUsize,
}

impl FlakyAdapter {
    fn new(name: &'static str) -> Self {
        Self {
            name,
            calls: AtomicUsize::new(0),
        }
    }
    fn count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProviderAdapter for FlakyAdapter {
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
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(MercatoError::network(self.name, "flaky upstream"))
    }
}

/// Fails every call with a rate-limit error.
struct ThrottledAdapter {
    name: &'static str,
}

#[async_trait]
impl ProviderAdapter for ThrottledAdapter {
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
        Err(MercatoError::rate_limited(self.name))
    }
}

fn daily_request(symbol: &str) -> DataRequest {
    DataRequest::builder(DataKind::DailyBar)
        .symbol(symbol)
        .build()
        .unwrap()
}

#[tokio::test]
async fn five_consecutive_failures_trigger_cooldown() {
    let flaky = Arc::new(FlakyAdapter::new("alpha"));
    let orchestrator = Orchestrator::builder()
        .with_adapter(flaky.clone(), AdapterConfig::with_priority(1))
        .with_adapter(
            Arc::new(MockAdapter::named("beta")),
            AdapterConfig::with_priority(2),
        )
        .with_adapter(
            Arc::new(MockAdapter::named("gamma")),
            AdapterConfig::with_priority(3),
        )
        .build()
        .await
        .unwrap();

    // Each request tries alpha first, it fails, beta serves. After five
    // failures the EWMA (0.9^5 ~ 0.59) crosses the 0.7 floor.
    for _ in 0..5 {
        let resp = orchestrator.get(&daily_request("AAPL")).await.unwrap();
        assert!(resp.success);
        assert_eq!(resp.provider, "beta");
    }
    assert_eq!(flaky.count(), 5);

    let info = orchestrator.adapter_info();
    assert_eq!(info[0].name, "alpha");
    assert!(info[0].in_cooldown);
    assert!(info[0].success_rate < 0.7);

    // While cooled down, alpha ranks below both healthy adapters; beta
    // serves without alpha being attempted.
    let resp = orchestrator.get(&daily_request("AAPL")).await.unwrap();
    assert_eq!(resp.provider, "beta");
    assert_eq!(flaky.count(), 5);
}

#[tokio::test]
async fn rate_limit_error_forces_immediate_cooldown() {
    let orchestrator = Orchestrator::builder()
        .with_adapter(
            Arc::new(ThrottledAdapter { name: "alpha" }),
            AdapterConfig::with_priority(1),
        )
        .with_adapter(
            Arc::new(MockAdapter::named("beta")),
            AdapterConfig::with_priority(2),
        )
        .build()
        .await
        .unwrap();

    let resp = orchestrator.get(&daily_request("AAPL")).await.unwrap();
    assert!(resp.success);

    // one rate-limit answer is enough, no EWMA decay needed
    let info = orchestrator.adapter_info();
    assert!(info[0].in_cooldown);
    assert_eq!(info[0].status, AdapterStatus::Limited);
}

#[tokio::test]
async fn usage_counters_reflect_dispatch() {
    let orchestrator = Orchestrator::builder()
        .with_adapter(
            Arc::new(MockAdapter::named("alpha")),
            AdapterConfig::with_priority(1),
        )
        .build()
        .await
        .unwrap();

    for _ in 0..3 {
        orchestrator.get(&daily_request("AAPL")).await.unwrap();
    }
    let info = orchestrator.adapter_info();
    assert_eq!(info[0].usage_count, 3);
    assert_eq!(info[0].recent_requests, 3);
}

#[tokio::test]
async fn timeout_counts_as_failure() {
    let orchestrator = Orchestrator::builder()
        .with_adapter(
            Arc::new(MockAdapter::named("alpha")),
            AdapterConfig::with_priority(1),
        )
        .adapter_timeout(std::time::Duration::from_millis(20))
        .build()
        .await
        .unwrap();

    // the TIMEOUT sentinel sleeps 200ms, past the 20ms deadline
    let resp = orchestrator
        .get(&daily_request(mercato_mock::TIMEOUT))
        .await
        .unwrap();
    assert!(!resp.success);
    assert!(resp.error.unwrap().contains("timed out"));

    let info = orchestrator.adapter_info();
    assert!(info[0].success_rate < 1.0);
}
