//! Candidate fetcher: the only writer of the all-candidates cache entry.
//!
//! `fetch_all_candidates(true)` trusts the disk snapshot when one is present
//! and seeds the memory cache from it. Otherwise (or with `use_cache = false`)
//! it walks every upstream page, then writes memory and disk. A failed page
//! aborts the whole fetch and nothing is written.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use super::pacing::PagePacer;
use super::snapshot::SnapshotStore;
use super::{Candidate, WorkableApi, WorkableError};
use crate::cache::TtlCache;
use crate::config::WorkableConfig;
use crate::metrics::{names, MetricsRegistry};

/// Memory cache key for the full candidate list.
pub const ALL_CANDIDATES_KEY: &str = "workable:all_candidates";

/// Shared cache type holding candidate lists.
pub type CandidateCache = TtlCache<Arc<Vec<Candidate>>>;

#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub base_url: String,
    pub page_size: u32,
    pub cache_ttl: Duration,
}

impl FetchSettings {
    pub fn from_config(config: &WorkableConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            page_size: config.page_size,
            cache_ttl: config.cache_ttl,
        }
    }

    pub fn first_page_url(&self) -> String {
        format!("{}/candidates?limit={}", self.base_url, self.page_size)
    }
}

pub struct CandidateFetcher<A> {
    api: Arc<A>,
    cache: Arc<CandidateCache>,
    snapshot: SnapshotStore,
    pacer: PagePacer,
    settings: FetchSettings,
    metrics: Arc<MetricsRegistry>,
}

impl<A: WorkableApi> CandidateFetcher<A> {
    pub fn new(
        api: Arc<A>,
        cache: Arc<CandidateCache>,
        snapshot: SnapshotStore,
        pacer: PagePacer,
        settings: FetchSettings,
        metrics: Arc<MetricsRegistry>,
    ) -> Self {
        Self {
            api,
            cache,
            snapshot,
            pacer,
            settings,
            metrics,
        }
    }

    pub fn snapshot(&self) -> &SnapshotStore {
        &self.snapshot
    }

    /// Return every upstream candidate, honouring the snapshot when `use_cache` is set.
    pub async fn fetch_all_candidates(
        &self,
        use_cache: bool,
    ) -> Result<Arc<Vec<Candidate>>, WorkableError> {
        if use_cache {
            if let Some(cached) = self.snapshot.load().await {
                self.metrics.incr(names::SNAPSHOT_HITS);
                info!(count = cached.len(), "using file-cached candidate data");
                let cached = Arc::new(cached);
                self.cache
                    .set_with_ttl(ALL_CANDIDATES_KEY, Arc::clone(&cached), self.settings.cache_ttl);
                return Ok(cached);
            }
            self.metrics.incr(names::SNAPSHOT_MISSES);
            info!("no candidate snapshot, fetching from Workable");
        } else {
            info!("fetching fresh candidate data from Workable");
        }

        let sync_id = Uuid::new_v4();
        let started = Instant::now();
        let result = self
            .fetch_from_upstream()
            .instrument(info_span!("workable_sync", %sync_id))
            .await;
        self.metrics.observe_since(names::FULL_SYNC, started);

        let candidates = match result {
            Ok(c) => Arc::new(c),
            Err(e) => {
                self.metrics.incr(names::SYNC_FAILURES);
                warn!(%sync_id, error = %e, "candidate sync failed");
                return Err(e);
            }
        };

        self.cache.set_with_ttl(
            ALL_CANDIDATES_KEY,
            Arc::clone(&candidates),
            self.settings.cache_ttl,
        );
        match self.snapshot.save(&candidates).await {
            Ok(()) => info!(count = candidates.len(), "cached candidates to file and memory"),
            Err(e) => {
                self.metrics.incr(names::SNAPSHOT_WRITE_FAILURES);
                warn!(error = %e, "failed to write candidate snapshot");
            }
        }
        Ok(candidates)
    }

    /// Cache-only read: memory first, then the snapshot (which re-seeds memory).
    /// Never calls upstream.
    pub async fn cached_candidates(&self) -> Option<Arc<Vec<Candidate>>> {
        if let Some(hit) = self.cache.get(ALL_CANDIDATES_KEY) {
            self.metrics.incr(names::MEMORY_HITS);
            return Some(hit);
        }
        let loaded = Arc::new(self.snapshot.load().await?);
        self.metrics.incr(names::SNAPSHOT_HITS);
        self.cache
            .set_with_ttl(ALL_CANDIDATES_KEY, Arc::clone(&loaded), self.settings.cache_ttl);
        Some(loaded)
    }

    async fn fetch_from_upstream(&self) -> Result<Vec<Candidate>, WorkableError> {
        let mut all = Vec::new();
        let mut next_url = Some(self.settings.first_page_url());
        let mut pages = 0u32;

        while let Some(url) = next_url.take() {
            let started = Instant::now();
            let page = self.api.candidate_page(&url).await?;
            self.metrics.observe_since(names::PAGE_FETCH, started);
            self.metrics.incr(names::PAGES_FETCHED);
            pages += 1;

            next_url = page.next_url().map(str::to_string);
            all.extend(page.candidates);
            debug!(page = pages, total = all.len(), "fetched candidate page");

            if next_url.is_some() {
                self.pacer.pause().await;
            }
        }

        info!(pages, total = all.len(), "candidate pagination complete");
        Ok(all)
    }
}
