use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::MercatoError;
use crate::kind::DataKind;

/// Either a single symbol or a non-empty list of symbols.
///
/// The two-variant shape encodes the "exactly one of" rule in the type, so a
/// request can never carry both a single symbol and a list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SymbolSelector {
    /// A single instrument symbol.
    One(String),
    /// Several instrument symbols; must be non-empty.
    Many(Vec<String>),
}

impl SymbolSelector {
    /// All symbols covered by the selector, in request order.
    #[must_use]
    pub fn symbols(&self) -> &[String] {
        match self {
            Self::One(s) => std::slice::from_ref(s),
            Self::Many(list) => list,
        }
    }

    /// Short human-readable label for logs and error messages.
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::One(s) => s.clone(),
            Self::Many(list) => format!("{} symbols", list.len()),
        }
    }
}

/// Immutable description of one data retrieval.
///
/// Built through [`DataRequest::builder`]; `validate` is called by the
/// orchestrator before any adapter is consulted, so adapters may assume a
/// well-formed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataRequest {
    /// Category of data requested.
    pub kind: DataKind,
    /// Instrument selection.
    pub symbols: SymbolSelector,
    /// Inclusive range start, if the kind is date-ranged.
    pub start: Option<NaiveDate>,
    /// Inclusive range end, if the kind is date-ranged.
    pub end: Option<NaiveDate>,
    /// Column projection; empty means "all columns the adapter has".
    pub fields: Vec<String>,
    /// Adapter-agnostic extra parameters (e.g. `period=annual`).
    pub params: BTreeMap<String, String>,
}

impl DataRequest {
    /// Start building a request for `kind`.
    #[must_use]
    pub fn builder(kind: DataKind) -> DataRequestBuilder {
        DataRequestBuilder::new(kind)
    }

    /// Check structural invariants.
    ///
    /// # Errors
    /// Returns `InvalidRequest` when the symbol list is empty, a symbol is
    /// blank, or the date range is inverted.
    pub fn validate(&self) -> Result<(), MercatoError> {
        let symbols = self.symbols.symbols();
        if symbols.is_empty() {
            return Err(MercatoError::invalid_request("empty symbol list"));
        }
        if symbols.iter().any(|s| s.trim().is_empty()) {
            return Err(MercatoError::invalid_request("blank symbol"));
        }
        if let (Some(start), Some(end)) = (self.start, self.end)
            && end < start
        {
            return Err(MercatoError::invalid_request(format!(
                "date range inverted: {start} > {end}"
            )));
        }
        Ok(())
    }
}

/// Builder for [`DataRequest`].
#[derive(Debug, Clone)]
pub struct DataRequestBuilder {
    kind: DataKind,
    symbols: Option<SymbolSelector>,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    fields: Vec<String>,
    params: BTreeMap<String, String>,
}

impl DataRequestBuilder {
    fn new(kind: DataKind) -> Self {
        Self {
            kind,
            symbols: None,
            start: None,
            end: None,
            fields: Vec::new(),
            params: BTreeMap::new(),
        }
    }

    /// Request a single symbol.
    #[must_use]
    pub fn symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbols = Some(SymbolSelector::One(symbol.into()));
        self
    }

    /// Request several symbols.
    #[must_use]
    pub fn symbols<I, S>(mut self, symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.symbols = Some(SymbolSelector::Many(
            symbols.into_iter().map(Into::into).collect(),
        ));
        self
    }

    /// Inclusive date range.
    #[must_use]
    pub const fn range(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.start = Some(start);
        self.end = Some(end);
        self
    }

    /// Restrict the returned columns.
    #[must_use]
    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Attach an extra adapter-agnostic parameter.
    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Finalize the request.
    ///
    /// # Errors
    /// Returns `InvalidRequest` when no symbols were given or the structural
    /// invariants of [`DataRequest::validate`] fail.
    pub fn build(self) -> Result<DataRequest, MercatoError> {
        let symbols = self
            .symbols
            .ok_or_else(|| MercatoError::invalid_request("no symbols given"))?;
        let req = DataRequest {
            kind: self.kind,
            symbols,
            start: self.start,
            end: self.end,
            fields: self.fields,
            params: self.params,
        };
        req.validate()?;
        Ok(req)
    }
}
