//! Failover demo against mock adapters.
//!
//! Run with `RUST_LOG=mercato=debug cargo run --example failover` to watch
//! the selection order and cooldown decisions in the logs.

use std::sync::Arc;

use mercato::{AdapterConfig, DataKind, DataRequest, MercatoError, Orchestrator};
use mercato_mock::MockAdapter;

#[tokio::main]
async fn main() -> Result<(), MercatoError> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let orchestrator = Orchestrator::builder()
        .with_adapter(
            Arc::new(MockAdapter::named("primary")),
            AdapterConfig::with_priority(1),
        )
        .with_adapter(
            Arc::new(MockAdapter::named("fallback").with_close_offset(0.5)),
            AdapterConfig::with_priority(2),
        )
        .build()
        .await?;

    let request = DataRequest::builder(DataKind::DailyBar)
        .symbol("AAPL")
        .build()?;
    let response = orchestrator.get(&request).await?;
    println!(
        "{} rows from {} (success: {})",
        response.meta.row_count, response.provider, response.success
    );

    for info in orchestrator.adapter_info() {
        println!(
            "{:<10} status={} rate={:.2} used={}",
            info.name, info.status, info.success_rate, info.usage_count
        );
    }

    orchestrator.close().await;
    Ok(())
}
