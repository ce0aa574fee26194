use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::MercatoError;
use crate::kind::{AdapterStatus, DataKind};
use crate::request::DataRequest;
use crate::response::DataResponse;

/// Typed, stable identifier for an adapter implementation.
///
/// Used in orchestrator configuration and reports instead of raw strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AdapterKey(pub &'static str);

impl AdapterKey {
    /// The raw identifier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        self.0
    }
}

impl std::fmt::Display for AdapterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0)
    }
}

/// Contract implemented by every data source.
///
/// Implementations must be cheap to construct and hold their own upstream
/// state (HTTP clients, sessions). The orchestrator enforces a per-call
/// timeout on top of `fetch`, but implementations should still return typed
/// errors promptly rather than hang, and must never silently truncate a
/// requested date range: partial coverage is reported through the payload,
/// not hidden.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Short unique adapter name, used in logs, errors, and reports.
    fn name(&self) -> &'static str;

    /// Typed identifier; defaults to wrapping [`name`](Self::name).
    fn key(&self) -> AdapterKey {
        AdapterKey(self.name())
    }

    /// One-line human description of the upstream source.
    fn description(&self) -> &'static str {
        ""
    }

    /// Data kinds this adapter can serve.
    fn supported_kinds(&self) -> &'static [DataKind];

    /// Convenience membership test over [`supported_kinds`](Self::supported_kinds).
    fn supports(&self, kind: DataKind) -> bool {
        self.supported_kinds().contains(&kind)
    }

    /// Cheap, non-blocking probe of the upstream.
    ///
    /// Called once at registration and again on operator demand; the
    /// orchestrator tracks status changes itself afterwards.
    async fn check_availability(&self) -> AdapterStatus;

    /// Acquire upstream resources (sessions, tokens).
    ///
    /// # Errors
    /// Returns the typed error that prevented initialization.
    async fn initialize(&self) -> Result<(), MercatoError> {
        Ok(())
    }

    /// Fetch data for a validated request.
    ///
    /// # Errors
    /// Returns a variant of [`MercatoError`] describing the failure; the
    /// orchestrator maps variants to health penalties.
    async fn fetch(&self, request: &DataRequest) -> Result<DataResponse, MercatoError>;

    /// Release upstream resources. Infallible by contract; log, don't fail.
    async fn close(&self) {}
}
