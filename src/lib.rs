//! GIGABRANDS hiring sync: Workable candidates behind a memory + disk cache.
//! Library entry: application wiring and tracing setup.

pub mod cache;
pub mod config;
pub mod metrics;
pub mod roles;
pub mod workable;

use std::sync::Arc;

use tracing::{info, warn};

use config::{LogFormat, WorkableConfig};
use metrics::MetricsRegistry;
use roles::{RoleDirectory, RoleSource};
use workable::client::WorkableClient;
use workable::fetcher::{CandidateCache, CandidateFetcher, FetchSettings};
use workable::pacing::PagePacer;
use workable::service::HiringService;
use workable::snapshot::SnapshotStore;
use workable::WorkableError;

/// Everything a front-end needs, constructed once at startup and passed down.
pub struct AppContext {
    pub config: WorkableConfig,
    pub client: Arc<WorkableClient>,
    pub cache: Arc<CandidateCache>,
    pub metrics: Arc<MetricsRegistry>,
    pub fetcher: Arc<CandidateFetcher<WorkableClient>>,
    pub hiring: HiringService<WorkableClient>,
}

impl AppContext {
    pub fn new(config: WorkableConfig) -> Result<Self, WorkableError> {
        let client = Arc::new(WorkableClient::new(&config)?);
        if config.api_key.is_none() {
            warn!("WORKABLE_API_KEY not set, only cached candidate data is available");
        }

        let cache = Arc::new(CandidateCache::with_default_ttl(config.cache_ttl));
        let metrics = Arc::new(MetricsRegistry::new());
        let fetcher = Arc::new(CandidateFetcher::new(
            Arc::clone(&client),
            Arc::clone(&cache),
            SnapshotStore::new(config.snapshot_path.clone(), config.snapshot_max_age),
            PagePacer::fixed(config.page_delay),
            FetchSettings::from_config(&config),
            Arc::clone(&metrics),
        ));

        let roles: Arc<dyn RoleSource> = match &config.roles_path {
            Some(path) => match RoleDirectory::load_from_file(path) {
                Ok(dir) => {
                    info!(path = %path.display(), roles = dir.len(), "role directory loaded");
                    Arc::new(dir)
                }
                Err(e) => {
                    warn!(error = %e, "role directory load failed, using empty");
                    Arc::new(RoleDirectory::empty())
                }
            },
            None => Arc::new(RoleDirectory::empty()),
        };

        let hiring = HiringService::new(
            Arc::clone(&client),
            Arc::clone(&fetcher),
            roles,
            config.profile_base_url.clone(),
        );

        info!(
            base_url = %config.base_url,
            snapshot = %config.snapshot_path.display(),
            page_delay_ms = config.page_delay.as_millis() as u64,
            "hiring context ready"
        );

        Ok(Self {
            config,
            client,
            cache,
            metrics,
            fetcher,
            hiring,
        })
    }
}

/// Install the global tracing subscriber. Logs go to stderr.
pub fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("gigabrands_hiring=info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}
