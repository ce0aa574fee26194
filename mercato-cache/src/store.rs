use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};
use tracing::warn;

use mercato_core::{DataKind, DataResponse, MercatoError};

/// Shared durable tier backed by a SQLite database file.
///
/// Besides the payload, every row carries access accounting so operators can
/// see which entries actually earn their keep.
pub struct SqliteTier {
    conn: Mutex<Connection>,
}

fn db_err(e: rusqlite::Error) -> MercatoError {
    MercatoError::Cache(format!("sqlite: {e}"))
}

impl SqliteTier {
    /// Open (or create) the database at `path` and ensure the schema.
    ///
    /// # Errors
    /// Returns a `Cache` error when the database cannot be opened.
    pub fn open(path: PathBuf) -> Result<Self, MercatoError> {
        let conn = Connection::open(&path).map_err(db_err)?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS cache_entries (
                cache_key    TEXT PRIMARY KEY,
                data_kind    TEXT NOT NULL,
                payload      TEXT NOT NULL,
                provider     TEXT NOT NULL,
                row_count    INTEGER NOT NULL,
                created_at   INTEGER NOT NULL,
                expires_at   INTEGER NOT NULL,
                access_count INTEGER NOT NULL DEFAULT 0,
                last_access  INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_cache_entries_kind
                ON cache_entries (data_kind);",
        )
        .map_err(db_err)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Live value for `key`, bumping its access accounting.
    ///
    /// Expired rows are deleted and reported as a miss.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<DataResponse> {
        let Ok(conn) = self.conn.lock() else {
            return None;
        };
        let now = Utc::now().timestamp();
        let row: Option<(String, i64)> = conn
            .query_row(
                "SELECT payload, expires_at FROM cache_entries WHERE cache_key = ?1",
                params![key],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .ok()
            .flatten();
        let (payload, expires_at) = row?;
        if expires_at <= now {
            let _ = conn.execute(
                "DELETE FROM cache_entries WHERE cache_key = ?1",
                params![key],
            );
            return None;
        }
        if let Err(e) = conn.execute(
            "UPDATE cache_entries
                SET access_count = access_count + 1, last_access = ?2
                WHERE cache_key = ?1",
            params![key, now],
        ) {
            warn!(error = %e, "failed to bump cache access accounting");
        }
        match serde_json::from_str(&payload) {
            Ok(resp) => Some(resp),
            Err(e) => {
                warn!(error = %e, "dropping corrupt cache row");
                let _ = conn.execute(
                    "DELETE FROM cache_entries WHERE cache_key = ?1",
                    params![key],
                );
                None
            }
        }
    }

    /// Insert or replace the row for `key` with the given lifetime.
    ///
    /// # Errors
    /// Returns a `Cache` error when serialization or the write fails.
    pub fn put(
        &self,
        key: &str,
        response: &DataResponse,
        ttl: Duration,
    ) -> Result<(), MercatoError> {
        let payload = serde_json::to_string(response)
            .map_err(|e| MercatoError::Cache(format!("encode payload: {e}")))?;
        let now = Utc::now().timestamp();
        #[allow(clippy::cast_possible_wrap)]
        let expires_at = now + ttl.as_secs() as i64;
        let conn = self
            .conn
            .lock()
            .map_err(|_| MercatoError::Cache("store mutex poisoned".into()))?;
        conn.execute(
            "INSERT OR REPLACE INTO cache_entries
                (cache_key, data_kind, payload, provider, row_count,
                 created_at, expires_at, access_count, last_access)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 0, ?6)",
            params![
                key,
                response.kind.as_str(),
                payload,
                response.provider,
                response.table.row_count() as i64,
                now,
                expires_at,
            ],
        )
        .map_err(db_err)?;
        Ok(())
    }

    /// Delete all rows, or only those of one kind.
    ///
    /// # Errors
    /// Returns a `Cache` error when the delete fails.
    pub fn clear(&self, kind: Option<DataKind>) -> Result<(), MercatoError> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| MercatoError::Cache("store mutex poisoned".into()))?;
        match kind {
            None => conn.execute("DELETE FROM cache_entries", []),
            Some(kind) => conn.execute(
                "DELETE FROM cache_entries WHERE data_kind = ?1",
                params![kind.as_str()],
            ),
        }
        .map_err(db_err)?;
        Ok(())
    }

    /// Number of rows, expired ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        let Ok(conn) = self.conn.lock() else {
            return 0;
        };
        conn.query_row("SELECT COUNT(*) FROM cache_entries", [], |row| {
            row.get::<_, i64>(0)
        })
        .map_or(0, |n| usize::try_from(n).unwrap_or(0))
    }

    /// True when the tier holds no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
