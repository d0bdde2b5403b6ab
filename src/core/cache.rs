//! Best-effort TTL cache over a pluggable string key-value backend.
//!
//! The cache is strictly advisory: storage and serialization failures are logged
//! and swallowed, never surfaced to the caller, so a broken or full backend can
//! never block the primary data path. Expired entries are reported as misses but
//! are not deleted; the next successful fetch overwrites them.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// Failures a storage backend may report on write paths.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend ran out of room (the quota-exceeded case).
    #[error("storage quota exceeded")]
    QuotaExceeded,
    /// The backend is unavailable or rejected the operation.
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// A string key-value store the cache persists into.
///
/// Backends must tolerate missing persistence: `read` returns `None` rather than
/// failing, and write-path errors are reported through [`StorageError`] (the
/// cache logs and discards them).
pub trait CacheStorage: Send + Sync {
    /// Read the raw value stored under `key`, if any.
    fn read(&self, key: &str) -> Option<String>;
    /// Store `value` under `key`, overwriting any previous value.
    fn write(&self, key: &str, value: &str) -> Result<(), StorageError>;
    /// Remove the value stored under `key`.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
    /// List all keys currently present.
    fn keys(&self) -> Vec<String>;
}

/// The default in-memory backend.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    map: Mutex<HashMap<String, String>>,
}

impl CacheStorage for MemoryStorage {
    fn read(&self, key: &str) -> Option<String> {
        self.map.lock().ok()?.get(key).cloned()
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut guard = self
            .map
            .lock()
            .map_err(|_| StorageError::Unavailable("storage lock poisoned".into()))?;
        guard.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut guard = self
            .map
            .lock()
            .map_err(|_| StorageError::Unavailable("storage lock poisoned".into()))?;
        guard.remove(key);
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        self.map
            .lock()
            .map(|m| m.keys().cloned().collect())
            .unwrap_or_default()
    }
}

#[derive(Serialize, Deserialize)]
struct Envelope<T> {
    payload: T,
    /// Milliseconds since the Unix epoch at store time.
    stored_at: i64,
    ttl_ms: i64,
}

/// A TTL cache storing timestamped JSON envelopes in a [`CacheStorage`] backend.
pub struct TtlCache {
    storage: Box<dyn CacheStorage>,
    default_ttl: Duration,
}

impl std::fmt::Debug for TtlCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TtlCache")
            .field("default_ttl", &self.default_ttl)
            .finish_non_exhaustive()
    }
}

impl TtlCache {
    /// Create a cache over `storage` with a default TTL for entries stored
    /// without an explicit one.
    pub fn new(storage: impl CacheStorage + 'static, default_ttl: Duration) -> Self {
        Self::from_boxed(Box::new(storage), default_ttl)
    }

    /// Like [`new`](Self::new), for an already-boxed backend.
    pub fn from_boxed(storage: Box<dyn CacheStorage>, default_ttl: Duration) -> Self {
        Self {
            storage,
            default_ttl,
        }
    }

    /// Store `value` under `key` with `ttl` (or the default TTL when `None`).
    ///
    /// Best-effort: failures are logged and swallowed.
    pub fn set<T: Serialize>(&self, key: &str, value: &T, ttl: Option<Duration>) {
        let ttl = ttl.unwrap_or(self.default_ttl);
        let envelope = Envelope {
            payload: value,
            stored_at: Utc::now().timestamp_millis(),
            ttl_ms: i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX),
        };
        let raw = match serde_json::to_string(&envelope) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(key, error = %e, "cache set skipped: serialization failed");
                return;
            }
        };
        if let Err(e) = self.storage.write(key, &raw) {
            warn!(key, error = %e, "cache set failed");
        }
    }

    /// Fetch the value stored under `key`, or `None` if absent, expired, or
    /// unreadable. Expired entries are left in place.
    #[must_use]
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.storage.read(key)?;
        let envelope: Envelope<T> = match serde_json::from_str(&raw) {
            Ok(env) => env,
            Err(e) => {
                warn!(key, error = %e, "cache get ignored corrupt entry");
                return None;
            }
        };
        let age_ms = Utc::now().timestamp_millis() - envelope.stored_at;
        if age_ms > envelope.ttl_ms {
            return None;
        }
        Some(envelope.payload)
    }

    /// Remove the entry stored under `key`. Best-effort.
    pub fn remove(&self, key: &str) {
        if let Err(e) = self.storage.remove(key) {
            warn!(key, error = %e, "cache remove failed");
        }
    }

    /// Remove all entries, or only those whose key starts with `prefix`.
    pub fn clear(&self, prefix: Option<&str>) {
        for key in self.storage.keys() {
            if prefix.is_none_or(|p| key.starts_with(p)) {
                self.remove(&key);
            }
        }
    }
}
