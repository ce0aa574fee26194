use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unified error type for the mercato workspace.
///
/// Adapters construct the variant that matches the failure they observed;
/// callers branch on variants, never on message text. The taxonomy is closed
/// so the orchestrator can penalize, cool down, or disable an adapter based on
/// the variant alone.
#[derive(Debug, Error, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum MercatoError {
    /// The adapter's upstream refused the call due to request-rate limits.
    #[error("{adapter} rate limited")]
    RateLimited {
        /// Adapter name that was throttled.
        adapter: String,
    },

    /// Credentials are missing, expired, or rejected.
    #[error("{adapter} unauthenticated: {msg}")]
    Unauthenticated {
        /// Adapter name whose credentials failed.
        adapter: String,
        /// Human-readable detail (never includes the credential itself).
        msg: String,
    },

    /// Transport-level failure: connect, TLS, DNS, or a 5xx from upstream.
    #[error("{adapter} network error: {msg}")]
    Network {
        /// Adapter name that failed.
        adapter: String,
        /// Human-readable error message.
        msg: String,
    },

    /// The upstream answered but has no data for the request.
    #[error("{adapter}: no data for {what}")]
    DataUnavailable {
        /// Adapter name that came back empty.
        adapter: String,
        /// Description of the missing data, e.g. "daily-bar for AAPL".
        what: String,
    },

    /// The request itself is malformed; no adapter was consulted.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// An individual adapter call exceeded the configured deadline.
    #[error("{adapter} timed out: {kind}")]
    Timeout {
        /// Adapter name that timed out.
        adapter: String,
        /// Data kind label the call was for.
        kind: String,
    },

    /// Cache tier failure (corrupt envelope, unreadable store).
    #[error("cache error: {0}")]
    Cache(String),

    /// All selected adapters failed; contains the individual failures.
    #[error("all adapters failed: {0:?}")]
    AllAdaptersFailed(Vec<MercatoError>),
}

impl MercatoError {
    /// Helper: build a `RateLimited` error.
    pub fn rate_limited(adapter: impl Into<String>) -> Self {
        Self::RateLimited {
            adapter: adapter.into(),
        }
    }

    /// Helper: build an `Unauthenticated` error.
    pub fn unauthenticated(adapter: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Unauthenticated {
            adapter: adapter.into(),
            msg: msg.into(),
        }
    }

    /// Helper: build a `Network` error.
    pub fn network(adapter: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Network {
            adapter: adapter.into(),
            msg: msg.into(),
        }
    }

    /// Helper: build a `DataUnavailable` error.
    pub fn data_unavailable(adapter: impl Into<String>, what: impl Into<String>) -> Self {
        Self::DataUnavailable {
            adapter: adapter.into(),
            what: what.into(),
        }
    }

    /// Helper: build an `InvalidRequest` error.
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    /// Helper: build a `Timeout` error.
    pub fn timeout(adapter: impl Into<String>, kind: impl Into<String>) -> Self {
        Self::Timeout {
            adapter: adapter.into(),
            kind: kind.into(),
        }
    }

    /// Name of the adapter this error is attributed to, if any.
    #[must_use]
    pub fn adapter(&self) -> Option<&str> {
        match self {
            Self::RateLimited { adapter }
            | Self::Unauthenticated { adapter, .. }
            | Self::Network { adapter, .. }
            | Self::DataUnavailable { adapter, .. }
            | Self::Timeout { adapter, .. } => Some(adapter),
            _ => None,
        }
    }

    /// Returns true if retrying the same adapter later could succeed.
    ///
    /// `Unauthenticated` and `InvalidRequest` are not transient: the former
    /// needs operator intervention, the latter will never succeed anywhere.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::RateLimited { .. }
            | Self::Network { .. }
            | Self::Timeout { .. }
            | Self::DataUnavailable { .. } => true,
            Self::AllAdaptersFailed(inner) => inner.iter().any(Self::is_transient),
            _ => false,
        }
    }

    /// Flatten nested `AllAdaptersFailed` structures into a plain vector.
    #[must_use]
    pub fn flatten(self) -> Vec<Self> {
        match self {
            Self::AllAdaptersFailed(list) => list.into_iter().flat_map(Self::flatten).collect(),
            other => vec![other],
        }
    }
}
