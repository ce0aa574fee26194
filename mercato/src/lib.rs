//! mercato
//!
//! Provider-agnostic market data orchestrator. Registered adapters are
//! ranked per request by a health score (EWMA success rate, rolling usage,
//! cooldowns, rate pressure) and consulted through one of three strategies:
//! sequential failover, concurrent fan-out with fusion, or agreement-checked
//! cross-validation. An optional tiered cache short-circuits repeat requests.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use mercato::{Orchestrator, AdapterConfig, DataKind, DataRequest};
//!
//! let orchestrator = Orchestrator::builder()
//!     .with_adapter(Arc::new(primary), AdapterConfig::with_priority(1))
//!     .with_adapter(Arc::new(fallback), AdapterConfig::with_priority(2))
//!     .build()
//!     .await?;
//!
//! let req = DataRequest::builder(DataKind::DailyBar).symbol("AAPL").build()?;
//! let resp = orchestrator.get(&req).await?;
//! if resp.success {
//!     println!("{} rows from {}", resp.meta.row_count, resp.provider);
//! }
//! ```
//!
//! Provider-side failure never surfaces as `Err`: the only error `get`
//! returns is `InvalidRequest`. Everything else comes back as a response
//! with `success == false` and the per-adapter reasons attached.
#![warn(missing_docs)]

mod core;
mod health;
mod report;
mod retrieval;
mod selection;

pub use crate::core::{Orchestrator, OrchestratorBuilder};
pub use crate::report::{AdapterInfo, HealthReport};

pub use mercato_cache::{Cache, CacheConfig, CacheStats, CacheTier, KindPolicy};
pub use mercato_core::{
    AdapterConfig, AdapterKey, AdapterStatus, Cell, DataKind, DataRequest, DataRequestBuilder,
    DataResponse, DataTable, MercatoError, OrchestratorConfig, ProviderAdapter, ResponseMeta,
    RetrievalStrategy, SymbolSelector, columns,
};
pub use mercato_fusion::{FusionConfig, FusionEngine, FusionStrategy, QualityMetrics};
