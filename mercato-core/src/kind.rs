use core::fmt;
use serde::{Deserialize, Serialize};

/// Closed set of data categories served by adapters.
///
/// These label requests, cache policies, and error/telemetry output, and
/// allow match-exhaustive handling when a new category is added.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum DataKind {
    /// Static descriptive data: listing metadata, sector, name.
    InstrumentMetadata,
    /// End-of-day OHLCV bars.
    DailyBar,
    /// Intraday OHLCV bars.
    IntradayBar,
    /// Index level series.
    IndexSeries,
    /// Periodic fundamental statements.
    FundamentalStatement,
    /// News items for an instrument.
    NewsItem,
}

impl DataKind {
    /// Stable, kebab-case identifier for logs, errors, and cache keys.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InstrumentMetadata => "instrument-metadata",
            Self::DailyBar => "daily-bar",
            Self::IntradayBar => "intraday-bar",
            Self::IndexSeries => "index-series",
            Self::FundamentalStatement => "fundamental-statement",
            Self::NewsItem => "news-item",
        }
    }

    /// True for kinds whose payload is an OHLCV-shaped time series.
    #[must_use]
    pub const fn is_bar_series(self) -> bool {
        matches!(self, Self::DailyBar | Self::IntradayBar | Self::IndexSeries)
    }

    /// True for kinds that change slowly and tolerate long cache lifetimes.
    #[must_use]
    pub const fn is_slow_moving(self) -> bool {
        matches!(self, Self::InstrumentMetadata | Self::FundamentalStatement)
    }

    /// All kinds, in declaration order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::InstrumentMetadata,
            Self::DailyBar,
            Self::IntradayBar,
            Self::IndexSeries,
            Self::FundamentalStatement,
            Self::NewsItem,
        ]
    }
}

impl fmt::Display for DataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Last-known operational state of an adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum AdapterStatus {
    /// Registered, not yet probed.
    Ready,
    /// Probed and serving requests normally.
    Available,
    /// Serving requests but degraded (throttled or partially failing).
    Limited,
    /// Known to be down; skipped during selection.
    Unavailable,
    /// Failed in a way that needs operator intervention (e.g. bad credentials).
    Error,
}

impl AdapterStatus {
    /// Stable identifier for logs and reports.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ready => "ready",
            Self::Available => "available",
            Self::Limited => "limited",
            Self::Unavailable => "unavailable",
            Self::Error => "error",
        }
    }

    /// True if the adapter may be selected for requests.
    #[must_use]
    pub const fn is_operational(self) -> bool {
        matches!(self, Self::Ready | Self::Available | Self::Limited)
    }
}

impl fmt::Display for AdapterStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
