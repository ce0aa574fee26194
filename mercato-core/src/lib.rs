//! mercato-core
//!
//! Contract types and traits shared across the mercato workspace.
//!
//! - `kind`: the closed set of data categories and adapter status labels.
//! - `request`: the immutable [`DataRequest`] value object and its builder.
//! - `table`: the provider-neutral [`DataTable`] payload.
//! - `response`: the [`DataResponse`] envelope with per-request metadata.
//! - `adapter`: the [`ProviderAdapter`] trait every data source implements.
//! - `error`: the closed [`MercatoError`] taxonomy.
//! - `config`: adapter and orchestrator configuration.
//!
//! Async runtime (Tokio)
//! ---------------------
//! The adapter trait is `async_trait` and the orchestrator crate drives it
//! under a Tokio 1.x runtime; implementations must be `Send + Sync`.
#![warn(missing_docs)]

/// The `ProviderAdapter` trait and `AdapterKey` identifier.
pub mod adapter;
/// Adapter and orchestrator configuration types.
pub mod config;
/// The unified error taxonomy.
pub mod error;
/// Data categories and adapter status labels.
pub mod kind;
/// Request value objects and validation.
pub mod request;
/// Response envelope and metadata.
pub mod response;
/// Column-oriented table payloads.
pub mod table;

pub use adapter::{AdapterKey, ProviderAdapter};
pub use config::{AdapterConfig, OrchestratorConfig, RetrievalStrategy};
pub use error::MercatoError;
pub use kind::{AdapterStatus, DataKind};
pub use request::{DataRequest, DataRequestBuilder, SymbolSelector};
pub use response::{DataResponse, ResponseMeta};
pub use table::{Cell, DataTable, columns};
