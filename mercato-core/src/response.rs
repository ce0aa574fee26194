use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::kind::DataKind;
use crate::table::DataTable;

/// Auxiliary details carried alongside a response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ResponseMeta {
    /// Number of rows in the payload.
    pub row_count: usize,
    /// Number of sources that contributed to the payload.
    pub source_count: usize,
    /// Per-adapter failure notes collected during the attempt, in attempt order.
    pub failed_adapters: Vec<String>,
    /// True when the payload was served from the cache.
    pub from_cache: bool,
    /// True when post-fusion validation passed (or was not run).
    pub validation_passed: bool,
    /// Issues reported by post-fusion validation.
    pub validation_issues: Vec<String>,
}

/// Envelope for the outcome of one data retrieval.
///
/// `success` and the payload are independent axes: an empty table with
/// `success == true` means "the provider answered and there is genuinely no
/// data", which is not a failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataResponse {
    /// The tabular payload; empty on failure.
    pub table: DataTable,
    /// Name of the adapter (or `"merged"`) that produced the payload.
    pub provider: String,
    /// Data category of the payload.
    pub kind: DataKind,
    /// Retrieval timestamp, set by the producer.
    pub fetched_at: DateTime<Utc>,
    /// Whether the retrieval succeeded.
    pub success: bool,
    /// Failure description; present iff `success == false`.
    pub error: Option<String>,
    /// Auxiliary details.
    pub meta: ResponseMeta,
}

impl DataResponse {
    /// A successful single-source response.
    #[must_use]
    pub fn ok(provider: impl Into<String>, kind: DataKind, table: DataTable) -> Self {
        let meta = ResponseMeta {
            row_count: table.row_count(),
            source_count: 1,
            validation_passed: true,
            ..ResponseMeta::default()
        };
        Self {
            table,
            provider: provider.into(),
            kind,
            fetched_at: Utc::now(),
            success: true,
            error: None,
            meta,
        }
    }

    /// A failed response with no payload.
    #[must_use]
    pub fn failed(provider: impl Into<String>, kind: DataKind, error: impl Into<String>) -> Self {
        Self {
            table: DataTable::default(),
            provider: provider.into(),
            kind,
            fetched_at: Utc::now(),
            success: false,
            error: Some(error.into()),
            meta: ResponseMeta::default(),
        }
    }

    /// A successful multi-source response produced by fusion.
    #[must_use]
    pub fn merged(kind: DataKind, table: DataTable, source_count: usize) -> Self {
        let meta = ResponseMeta {
            row_count: table.row_count(),
            source_count,
            validation_passed: true,
            ..ResponseMeta::default()
        };
        Self {
            table,
            provider: "merged".into(),
            kind,
            fetched_at: Utc::now(),
            success: true,
            error: None,
            meta,
        }
    }

    /// True for a successful response that carries at least one row.
    #[must_use]
    pub fn has_data(&self) -> bool {
        self.success && !self.table.is_empty()
    }
}
