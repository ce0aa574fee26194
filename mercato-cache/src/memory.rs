use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use lru::LruCache;

use mercato_core::{DataKind, DataResponse};

struct Entry {
    value: DataResponse,
    expires_at: Instant,
}

/// In-process LRU tier with per-entry expiry.
///
/// Expired entries are evicted lazily, on the `get` that observes them.
pub struct MemoryTier {
    inner: Mutex<LruCache<String, Entry>>,
}

impl MemoryTier {
    /// Tier holding at most `capacity` entries.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        // Avoid zero capacity panics
        let cap = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(LruCache::new(cap)),
        }
    }

    /// Live (non-expired) value for `key`, refreshing its recency.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<DataResponse> {
        let Ok(mut guard) = self.inner.lock() else {
            return None;
        };
        if let Some(entry) = guard.get(key)
            && Instant::now() <= entry.expires_at
        {
            return Some(entry.value.clone());
        }
        // If expired, remove it and report a miss
        guard.pop(key).and_then(|_| None)
    }

    /// Insert `value` with the given lifetime, evicting the LRU entry at
    /// capacity.
    pub fn put(&self, key: String, value: DataResponse, ttl: Duration) {
        let expires_at = Instant::now() + ttl;
        if let Ok(mut guard) = self.inner.lock() {
            guard.put(key, Entry { value, expires_at });
        }
    }

    /// Drop all entries, or only those of one kind.
    pub fn clear(&self, kind: Option<DataKind>) {
        let Ok(mut guard) = self.inner.lock() else {
            return;
        };
        match kind {
            None => guard.clear(),
            Some(kind) => {
                let doomed: Vec<String> = guard
                    .iter()
                    .filter(|(_, e)| e.value.kind == kind)
                    .map(|(k, _)| k.clone())
                    .collect();
                for key in doomed {
                    guard.pop(&key);
                }
            }
        }
    }

    /// Number of entries currently held, expired ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().map_or(0, |guard| guard.len())
    }

    /// True when the tier holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
