use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use mercato_core::{DataKind, DataResponse, MercatoError};

/// On-disk envelope wrapping a cached response with its expiry.
#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    kind: DataKind,
    expires_at: DateTime<Utc>,
    response: DataResponse,
}

/// Durable local tier: one JSON envelope file per cache key.
pub struct DiskTier {
    dir: PathBuf,
}

impl DiskTier {
    /// Tier rooted at `dir`, creating the directory if needed.
    ///
    /// # Errors
    /// Returns a `Cache` error when the directory cannot be created.
    pub fn new(dir: PathBuf) -> Result<Self, MercatoError> {
        fs::create_dir_all(&dir)
            .map_err(|e| MercatoError::Cache(format!("create {}: {e}", dir.display())))?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    /// Live value for `key`; expired or unreadable envelopes are unlinked.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<DataResponse> {
        let path = self.path_for(key);
        let bytes = fs::read(&path).ok()?;
        match serde_json::from_slice::<Envelope>(&bytes) {
            Ok(env) if env.expires_at > Utc::now() => Some(env.response),
            Ok(_) => {
                remove_quietly(&path);
                None
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "dropping corrupt cache envelope");
                remove_quietly(&path);
                None
            }
        }
    }

    /// Write `response` under `key` with the given lifetime.
    ///
    /// # Errors
    /// Returns a `Cache` error when serialization or the write fails.
    pub fn put(
        &self,
        key: &str,
        response: &DataResponse,
        ttl: Duration,
    ) -> Result<(), MercatoError> {
        let env = Envelope {
            kind: response.kind,
            expires_at: Utc::now() + ttl,
            response: response.clone(),
        };
        let bytes = serde_json::to_vec(&env)
            .map_err(|e| MercatoError::Cache(format!("encode envelope: {e}")))?;
        let path = self.path_for(key);
        fs::write(&path, bytes)
            .map_err(|e| MercatoError::Cache(format!("write {}: {e}", path.display())))
    }

    /// Remove all envelopes, or only those of one kind.
    ///
    /// # Errors
    /// Returns a `Cache` error when the directory cannot be listed.
    pub fn clear(&self, kind: Option<DataKind>) -> Result<(), MercatoError> {
        for path in self.envelope_paths()? {
            let matches = match kind {
                None => true,
                Some(kind) => fs::read(&path)
                    .ok()
                    .and_then(|bytes| serde_json::from_slice::<Envelope>(&bytes).ok())
                    .is_some_and(|env| env.kind == kind),
            };
            if matches {
                remove_quietly(&path);
            }
        }
        Ok(())
    }

    /// Number of envelope files, expired ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.envelope_paths().map_or(0, |paths| paths.len())
    }

    /// True when the tier holds no envelopes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn envelope_paths(&self) -> Result<Vec<PathBuf>, MercatoError> {
        let entries = fs::read_dir(&self.dir)
            .map_err(|e| MercatoError::Cache(format!("read {}: {e}", self.dir.display())))?;
        Ok(entries
            .filter_map(Result::ok)
            .map(|e| e.path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
            .collect())
    }
}

fn remove_quietly(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        warn!(path = %path.display(), error = %e, "failed to remove cache envelope");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mercato_core::{Cell, DataTable, columns};

    fn resp(kind: DataKind) -> DataResponse {
        let mut t = DataTable::new([columns::SYMBOL, columns::CLOSE]);
        t.push_row(vec![Cell::Text("AAPL".into()), Cell::Float(185.0)]);
        DataResponse::ok("alpha", kind, t)
    }

    #[test]
    fn round_trips_a_response() {
        let tmp = tempfile::tempdir().unwrap();
        let tier = DiskTier::new(tmp.path().join("blobs")).unwrap();
        let original = resp(DataKind::DailyBar);
        tier.put("k", &original, Duration::from_secs(60)).unwrap();
        let got = tier.get("k").unwrap();
        assert_eq!(got.table, original.table);
        assert_eq!(got.provider, original.provider);
    }

    #[test]
    fn expired_envelope_is_unlinked() {
        let tmp = tempfile::tempdir().unwrap();
        let tier = DiskTier::new(tmp.path().join("blobs")).unwrap();
        tier.put("k", &resp(DataKind::DailyBar), Duration::ZERO)
            .unwrap();
        std::thread::sleep(Duration::from_millis(5));
        assert!(tier.get("k").is_none());
        assert_eq!(tier.len(), 0);
    }

    #[test]
    fn corrupt_envelope_is_dropped() {
        let tmp = tempfile::tempdir().unwrap();
        let tier = DiskTier::new(tmp.path().join("blobs")).unwrap();
        fs::write(tmp.path().join("blobs/bad.json"), b"not json").unwrap();
        assert!(tier.get("bad").is_none());
        assert_eq!(tier.len(), 0);
    }

    #[test]
    fn clear_by_kind_is_selective() {
        let tmp = tempfile::tempdir().unwrap();
        let tier = DiskTier::new(tmp.path().join("blobs")).unwrap();
        let ttl = Duration::from_secs(60);
        tier.put("bars", &resp(DataKind::DailyBar), ttl).unwrap();
        tier.put("idx", &resp(DataKind::IndexSeries), ttl).unwrap();
        tier.clear(Some(DataKind::DailyBar)).unwrap();
        assert!(tier.get("bars").is_none());
        assert!(tier.get("idx").is_some());
    }
}
