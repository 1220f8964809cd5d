//! In-memory key/value cache with per-entry TTL.
//! Expiry is evaluated lazily: an expired entry is evicted by the `get` that
//! finds it, never by a background sweep. Every operation runs under one mutex
//! because evict-on-read is a read-modify-write.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::debug;

/// Default entry lifetime: 1 hour.
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

struct CacheEntry<V> {
    data: V,
    created_at: Instant,
    /// None when `created_at + ttl` is past what `Instant` can represent.
    expires_at: Option<Instant>,
}

impl<V> CacheEntry<V> {
    fn is_valid_at(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |at| now <= at)
    }
}

/// Snapshot of cache occupancy. Computing it never evicts anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct CacheStats {
    pub total_entries: usize,
    pub valid_entries: usize,
    pub expired_entries: usize,
}

/// Expiring store shared by every producer through an `Arc`.
pub struct TtlCache<V> {
    inner: Mutex<HashMap<String, CacheEntry<V>>>,
    default_ttl: Duration,
}

impl<V: Clone> TtlCache<V> {
    pub fn new() -> Self {
        Self::with_default_ttl(DEFAULT_TTL)
    }

    pub fn with_default_ttl(default_ttl: Duration) -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
            default_ttl,
        }
    }

    /// Look up `key`. Returns None if absent or expired; an expired entry is removed.
    pub fn get(&self, key: &str) -> Option<V> {
        self.get_at(key, Instant::now())
    }

    /// `get` against an explicit clock reading.
    pub fn get_at(&self, key: &str, now: Instant) -> Option<V> {
        let mut store = self.inner.lock();
        let entry = store.get(key)?;
        if entry.is_valid_at(now) {
            return Some(entry.data.clone());
        }
        let age_ms = now.saturating_duration_since(entry.created_at).as_millis() as u64;
        store.remove(key);
        debug!(key, age_ms, "cache entry expired, evicted");
        None
    }

    /// Store `data` under `key` with the default TTL, replacing any previous entry.
    pub fn set(&self, key: impl Into<String>, data: V) {
        self.set_with_ttl(key, data, self.default_ttl);
    }

    pub fn set_with_ttl(&self, key: impl Into<String>, data: V, ttl: Duration) {
        self.set_at(key, data, ttl, Instant::now());
    }

    /// `set_with_ttl` against an explicit clock reading. A TTL too large to
    /// represent keeps the entry until it is cleared or overwritten.
    pub fn set_at(&self, key: impl Into<String>, data: V, ttl: Duration, now: Instant) {
        let key = key.into();
        debug!(key = %key, ttl_secs = ttl.as_secs(), "cache set");
        self.inner.lock().insert(
            key,
            CacheEntry {
                data,
                created_at: now,
                expires_at: now.checked_add(ttl),
            },
        );
    }

    /// Remove one entry. Unknown keys are ignored.
    pub fn clear(&self, key: &str) {
        self.inner.lock().remove(key);
    }

    pub fn clear_all(&self) {
        self.inner.lock().clear();
    }

    pub fn stats(&self) -> CacheStats {
        self.stats_at(Instant::now())
    }

    pub fn stats_at(&self, now: Instant) -> CacheStats {
        let store = self.inner.lock();
        let valid_entries = store.values().filter(|e| e.is_valid_at(now)).count();
        CacheStats {
            total_entries: store.len(),
            valid_entries,
            expired_entries: store.len() - valid_entries,
        }
    }
}

impl<V: Clone> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new()
    }
}
