//! Sync observability: named counters plus per-operation latency windows.
//! A window keeps the most recent 1024 durations of one timed operation
//! (page fetch, full sync) and reports nearest-rank p50/p95/p99 over them.

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

const WINDOW_CAPACITY: usize = 1024;

/// Recent durations of one operation plus lifetime totals.
struct LatencyWindow {
    recent: VecDeque<Duration>,
    capacity: usize,
    observed: u64,
    slowest: Duration,
}

impl LatencyWindow {
    fn new(capacity: usize) -> Self {
        Self {
            recent: VecDeque::with_capacity(capacity),
            capacity,
            observed: 0,
            slowest: Duration::ZERO,
        }
    }

    fn record(&mut self, took: Duration) {
        if self.recent.len() == self.capacity {
            self.recent.pop_front();
        }
        self.recent.push_back(took);
        self.observed += 1;
        self.slowest = self.slowest.max(took);
    }

    /// Nearest-rank percentile in milliseconds. 0 when nothing was recorded.
    fn percentile_ms(&self, p: f64) -> f64 {
        let n = self.recent.len();
        if n == 0 {
            return 0.0;
        }
        let mut sorted: Vec<Duration> = self.recent.iter().copied().collect();
        sorted.sort_unstable();
        let rank = ((p / 100.0) * n as f64).ceil() as usize;
        as_ms(sorted[rank.clamp(1, n) - 1])
    }

    fn summary(&self) -> LatencySummary {
        LatencySummary {
            p50_ms: self.percentile_ms(50.0),
            p95_ms: self.percentile_ms(95.0),
            p99_ms: self.percentile_ms(99.0),
            max_ms: as_ms(self.slowest),
            window: self.recent.len(),
            total: self.observed,
        }
    }
}

fn as_ms(d: Duration) -> f64 {
    d.as_nanos() as f64 / 1_000_000.0
}

/// Percentiles cover the current window; `max_ms` and `total` cover every
/// observation since start.
#[derive(Debug, Clone, serde::Serialize)]
pub struct LatencySummary {
    pub p50_ms: f64,
    pub p95_ms: f64,
    pub p99_ms: f64,
    pub max_ms: f64,
    pub window: usize,
    pub total: u64,
}

#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct MetricsSnapshot {
    pub counters: HashMap<String, u64>,
    pub latencies: HashMap<String, LatencySummary>,
}

pub struct MetricsRegistry {
    counters: Mutex<HashMap<&'static str, u64>>,
    latencies: Mutex<HashMap<&'static str, LatencyWindow>>,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self {
            counters: Mutex::new(HashMap::new()),
            latencies: Mutex::new(HashMap::new()),
        }
    }

    pub fn incr(&self, name: &'static str) {
        self.add(name, 1);
    }

    pub fn add(&self, name: &'static str, n: u64) {
        *self.counters.lock().entry(name).or_insert(0) += n;
    }

    pub fn counter(&self, name: &str) -> u64 {
        self.counters.lock().get(name).copied().unwrap_or(0)
    }

    /// Record how long something took since `start`.
    pub fn observe_since(&self, name: &'static str, start: Instant) {
        self.observe(name, start.elapsed());
    }

    pub fn observe(&self, name: &'static str, took: Duration) {
        self.latencies
            .lock()
            .entry(name)
            .or_insert_with(|| LatencyWindow::new(WINDOW_CAPACITY))
            .record(took);
        tracing::trace!(metric = name, elapsed_ms = as_ms(took), "latency recorded");
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let counters = self
            .counters
            .lock()
            .iter()
            .map(|(&k, &v)| (k.to_string(), v))
            .collect();
        let latencies = self
            .latencies
            .lock()
            .iter()
            .map(|(&name, window)| (name.to_string(), window.summary()))
            .collect();
        MetricsSnapshot {
            counters,
            latencies,
        }
    }
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Well-known metric names.
pub mod names {
    pub const PAGE_FETCH: &str = "workable_page_fetch";
    pub const FULL_SYNC: &str = "workable_full_sync";
    pub const PAGES_FETCHED: &str = "workable_pages_fetched";
    pub const SYNC_FAILURES: &str = "workable_sync_failures";
    pub const SNAPSHOT_HITS: &str = "snapshot_hits";
    pub const SNAPSHOT_MISSES: &str = "snapshot_misses";
    pub const SNAPSHOT_WRITE_FAILURES: &str = "snapshot_write_failures";
    pub const MEMORY_HITS: &str = "memory_cache_hits";
}
