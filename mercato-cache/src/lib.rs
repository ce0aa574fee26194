//! mercato-cache
//!
//! Three-tier response cache keyed on the logical content of a
//! [`DataRequest`](mercato_core::DataRequest):
//!
//! - **memory**: in-process LRU with per-entry TTL, for high-frequency kinds.
//! - **disk**: one JSON envelope per key under a local directory, survives
//!   restarts.
//! - **store**: a SQLite database with access accounting, shareable between
//!   processes on the same host.
//!
//! Each [`DataKind`](mercato_core::DataKind) maps to exactly one tier and TTL
//! through [`CacheConfig`]; a TTL of zero disables caching for that kind.
//! All tier operations are synchronous and short; callers on async tasks
//! treat them like any other quick in-memory bookkeeping.
#![warn(missing_docs)]

/// Per-kind cache policy and cache construction settings.
pub mod config;
/// Local JSON blob tier.
pub mod disk;
/// Deterministic request keys.
pub mod key;
/// In-process LRU tier.
pub mod memory;
/// Shared SQLite tier.
pub mod store;

pub use config::{CacheConfig, CacheTier, KindPolicy};
pub use key::cache_key;

use serde::{Deserialize, Serialize};
use tracing::debug;

use mercato_core::{DataKind, DataRequest, DataResponse, MercatoError};

use crate::disk::DiskTier;
use crate::memory::MemoryTier;
use crate::store::SqliteTier;

/// Entry counts per tier, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Live entries in the memory tier.
    pub memory_entries: usize,
    /// Envelope files in the disk tier.
    pub disk_entries: usize,
    /// Rows in the store tier.
    pub store_entries: usize,
}

/// The tiered cache facade.
pub struct Cache {
    cfg: CacheConfig,
    memory: MemoryTier,
    disk: DiskTier,
    store: SqliteTier,
}

impl Cache {
    /// Open (or create) all tiers under the configured root directory.
    ///
    /// # Errors
    /// Returns `Cache` errors when the root directory or the SQLite store
    /// cannot be created.
    pub fn new(cfg: CacheConfig) -> Result<Self, MercatoError> {
        let disk = DiskTier::new(cfg.root.join("blobs"))?;
        let store = SqliteTier::open(cfg.root.join("store.db"))?;
        let memory = MemoryTier::new(cfg.memory_capacity);
        Ok(Self {
            cfg,
            memory,
            disk,
            store,
        })
    }

    /// Look up a cached response for `request`.
    ///
    /// A hit is marked `from_cache` in its metadata. Expired entries are
    /// evicted during the lookup and reported as a miss.
    #[must_use]
    pub fn get(&self, request: &DataRequest) -> Option<DataResponse> {
        let policy = self.cfg.policy(request.kind);
        if policy.ttl.is_zero() {
            return None;
        }
        let key = cache_key(request);
        let hit = match policy.tier {
            CacheTier::Memory => self.memory.get(&key),
            CacheTier::Disk => self.disk.get(&key),
            CacheTier::Store => self.store.get(&key),
        };
        debug!(kind = %request.kind, tier = ?policy.tier, hit = hit.is_some(), "cache lookup");
        hit.map(|mut resp| {
            resp.meta.from_cache = true;
            resp
        })
    }

    /// Store a response under the key derived from `request`.
    ///
    /// Failed or empty responses are never cached; a zero TTL for the kind
    /// makes this a no-op.
    ///
    /// # Errors
    /// Returns `Cache` errors from the durable tiers.
    pub fn put(&self, request: &DataRequest, response: &DataResponse) -> Result<(), MercatoError> {
        if !response.has_data() {
            return Ok(());
        }
        let policy = self.cfg.policy(request.kind);
        if policy.ttl.is_zero() {
            return Ok(());
        }
        let key = cache_key(request);
        match policy.tier {
            CacheTier::Memory => {
                self.memory.put(key, response.clone(), policy.ttl);
                Ok(())
            }
            CacheTier::Disk => self.disk.put(&key, response, policy.ttl),
            CacheTier::Store => self.store.put(&key, response, policy.ttl),
        }
    }

    /// Drop entries from every tier; `Some(kind)` restricts to one kind.
    ///
    /// # Errors
    /// Returns `Cache` errors from the durable tiers.
    pub fn clear(&self, kind: Option<DataKind>) -> Result<(), MercatoError> {
        self.memory.clear(kind);
        self.disk.clear(kind)?;
        self.store.clear(kind)?;
        Ok(())
    }

    /// Entry counts per tier.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            memory_entries: self.memory.len(),
            disk_entries: self.disk.len(),
            store_entries: self.store.len(),
        }
    }
}
