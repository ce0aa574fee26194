//! Mock adapter for CI-safe tests and examples.
//!
//! Serves deterministic fixture data for ordinary symbols and reacts to a
//! small set of sentinel symbols that force specific failure modes, so
//! orchestrator behavior can be exercised without any upstream.

use async_trait::async_trait;

use mercato_core::{
    AdapterStatus, DataKind, DataRequest, DataResponse, MercatoError, ProviderAdapter,
};

mod fixtures;

pub use fixtures::daily_table;

/// Sentinel symbol that makes the mock return a network error.
pub const FAIL: &str = "FAIL";
/// Sentinel symbol that makes the mock sleep past typical timeouts.
pub const TIMEOUT: &str = "TIMEOUT";
/// Sentinel symbol that makes the mock report a rate limit.
pub const RATELIMIT: &str = "RATELIMIT";
/// Sentinel symbol that makes the mock report bad credentials.
pub const AUTHFAIL: &str = "AUTHFAIL";
/// Sentinel symbol that makes the mock answer successfully with no rows.
pub const EMPTY: &str = "EMPTY";
/// Sentinel symbol that makes the mock report the data as unavailable.
pub const MISSING: &str = "MISSING";

/// Deterministic adapter backed by static fixtures.
pub struct MockAdapter {
    name: &'static str,
    kinds: &'static [DataKind],
    close_offset: f64,
    status: AdapterStatus,
}

impl Default for MockAdapter {
    fn default() -> Self {
        Self::named("mercato-mock")
    }
}

impl MockAdapter {
    /// Mock with the given name serving every kind.
    #[must_use]
    pub const fn named(name: &'static str) -> Self {
        Self {
            name,
            kinds: DataKind::all(),
            close_offset: 0.0,
            status: AdapterStatus::Available,
        }
    }

    /// Restrict the kinds this mock advertises.
    #[must_use]
    pub const fn serving(mut self, kinds: &'static [DataKind]) -> Self {
        self.kinds = kinds;
        self
    }

    /// Shift every close price by `offset`; lets tests make two mocks
    /// disagree by a known margin.
    #[must_use]
    pub const fn with_close_offset(mut self, offset: f64) -> Self {
        self.close_offset = offset;
        self
    }

    /// Fix the status reported by `check_availability`.
    #[must_use]
    pub const fn with_status(mut self, status: AdapterStatus) -> Self {
        self.status = status;
        self
    }

    async fn maybe_fail(&self, symbol: &str, kind: DataKind) -> Result<(), MercatoError> {
        match symbol {
            FAIL => Err(MercatoError::network(self.name, "forced failure")),
            TIMEOUT => {
                // Long enough to trip any sub-200ms orchestrator timeout
                tokio::time::sleep(std::time::Duration::from_millis(200)).await;
                Ok(())
            }
            RATELIMIT => Err(MercatoError::rate_limited(self.name)),
            AUTHFAIL => Err(MercatoError::unauthenticated(self.name, "forced auth failure")),
            MISSING => Err(MercatoError::data_unavailable(
                self.name,
                format!("{kind} for {symbol}"),
            )),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl ProviderAdapter for MockAdapter {
    fn name(&self) -> &'static str {
        self.name
    }

    fn description(&self) -> &'static str {
        "deterministic fixture-backed mock"
    }

    fn supported_kinds(&self) -> &'static [DataKind] {
        self.kinds
    }

    async fn check_availability(&self) -> AdapterStatus {
        self.status
    }

    async fn fetch(&self, request: &DataRequest) -> Result<DataResponse, MercatoError> {
        let symbols = request.symbols.symbols();
        for symbol in symbols {
            self.maybe_fail(symbol, request.kind).await?;
        }
        if symbols.iter().any(|s| s == EMPTY) {
            return Ok(DataResponse::ok(
                self.name,
                request.kind,
                mercato_core::DataTable::default(),
            ));
        }
        let table = fixtures::daily_table(symbols, request.start, request.end, self.close_offset);
        Ok(DataResponse::ok(self.name, request.kind, table))
    }
}
