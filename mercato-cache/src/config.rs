use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use mercato_core::DataKind;

/// Which tier holds entries for a given kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CacheTier {
    /// In-process LRU; lost on restart.
    Memory,
    /// Local JSON blobs; survives restarts.
    Disk,
    /// SQLite database; shareable between processes on the same host.
    Store,
}

/// TTL and tier for one data kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindPolicy {
    /// How long entries stay valid. Zero disables caching for the kind.
    pub ttl: Duration,
    /// Where entries live.
    pub tier: CacheTier,
}

impl KindPolicy {
    /// Policy with the given TTL in the given tier.
    #[must_use]
    pub const fn new(ttl: Duration, tier: CacheTier) -> Self {
        Self { ttl, tier }
    }
}

/// Default policy per kind.
///
/// Fast-moving kinds stay in memory with short lifetimes; slow-moving kinds
/// go to a durable tier and live for days.
#[must_use]
pub const fn default_policy(kind: DataKind) -> KindPolicy {
    match kind {
        DataKind::IntradayBar | DataKind::NewsItem => {
            KindPolicy::new(Duration::from_secs(5 * 60), CacheTier::Memory)
        }
        DataKind::DailyBar | DataKind::IndexSeries => {
            KindPolicy::new(Duration::from_secs(60 * 60), CacheTier::Disk)
        }
        DataKind::InstrumentMetadata => {
            KindPolicy::new(Duration::from_secs(24 * 60 * 60), CacheTier::Store)
        }
        DataKind::FundamentalStatement => {
            KindPolicy::new(Duration::from_secs(7 * 24 * 60 * 60), CacheTier::Store)
        }
        _ => KindPolicy::new(Duration::from_secs(30 * 60), CacheTier::Memory),
    }
}

/// Cache construction settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Directory holding the disk tier and the SQLite store.
    pub root: PathBuf,
    /// Maximum entries in the memory tier before LRU eviction.
    pub memory_capacity: usize,
    /// Per-kind overrides of [`default_policy`].
    pub overrides: HashMap<DataKind, KindPolicy>,
}

impl CacheConfig {
    /// Config rooted at `root` with default capacity and policies.
    #[must_use]
    pub fn rooted(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            memory_capacity: 256,
            overrides: HashMap::new(),
        }
    }

    /// Override the policy for one kind.
    #[must_use]
    pub fn with_policy(mut self, kind: DataKind, policy: KindPolicy) -> Self {
        self.overrides.insert(kind, policy);
        self
    }

    /// Effective policy for `kind`.
    #[must_use]
    pub fn policy(&self, kind: DataKind) -> KindPolicy {
        self.overrides
            .get(&kind)
            .copied()
            .unwrap_or_else(|| default_policy(kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slow_moving_kinds_default_to_durable_tiers() {
        assert_eq!(
            default_policy(DataKind::FundamentalStatement).tier,
            CacheTier::Store
        );
        assert_eq!(default_policy(DataKind::IntradayBar).tier, CacheTier::Memory);
        assert_eq!(default_policy(DataKind::DailyBar).tier, CacheTier::Disk);
    }

    #[test]
    fn overrides_take_precedence() {
        let cfg = CacheConfig::rooted("/tmp/x").with_policy(
            DataKind::DailyBar,
            KindPolicy::new(Duration::ZERO, CacheTier::Memory),
        );
        assert!(cfg.policy(DataKind::DailyBar).ttl.is_zero());
        assert_eq!(cfg.policy(DataKind::IntradayBar).tier, CacheTier::Memory);
    }
}
