//! Runtime configuration, read from environment variables.
//! Every knob has a default so the snapshot-only path works with no env at all;
//! the API key is checked lazily, right before the first upstream request.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_SUBDOMAIN: &str = "gigabrands";
pub const DEFAULT_SNAPSHOT_PATH: &str = "/tmp/workable_candidates_cache.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },
}

/// Log output format for the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone)]
pub struct WorkableConfig {
    pub api_key: Option<String>,
    /// e.g. `https://gigabrands.workable.com/spi/v3`
    pub base_url: String,
    /// Prefix for candidate profile links when upstream omits `profile_url`.
    pub profile_base_url: String,
    pub snapshot_path: PathBuf,
    /// None keeps the snapshot valid until it is deleted or overwritten.
    pub snapshot_max_age: Option<Duration>,
    pub page_size: u32,
    pub request_timeout: Duration,
    pub page_delay: Duration,
    pub cache_ttl: Duration,
    pub default_member_id: Option<String>,
    pub roles_path: Option<PathBuf>,
    pub log_format: LogFormat,
}

impl Default for WorkableConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: api_base_for(DEFAULT_SUBDOMAIN),
            profile_base_url: profile_base_for(DEFAULT_SUBDOMAIN),
            snapshot_path: PathBuf::from(DEFAULT_SNAPSHOT_PATH),
            snapshot_max_age: None,
            page_size: 100,
            request_timeout: Duration::from_secs(30),
            page_delay: Duration::from_millis(2000),
            cache_ttl: Duration::from_secs(3600),
            default_member_id: None,
            roles_path: None,
            log_format: LogFormat::Text,
        }
    }
}

impl WorkableConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let mut cfg = Self::default();

        if let Some(sub) = var("WORKABLE_SUBDOMAIN") {
            cfg.base_url = api_base_for(&sub);
            cfg.profile_base_url = profile_base_for(&sub);
        }
        if let Some(url) = var("WORKABLE_BASE_URL") {
            cfg.base_url = url.trim_end_matches('/').to_string();
        }
        cfg.api_key = var("WORKABLE_API_KEY");
        if let Some(path) = var("WORKABLE_SNAPSHOT_PATH") {
            cfg.snapshot_path = PathBuf::from(path);
        }
        if let Some(secs) = parse_var::<u64>(&var, "WORKABLE_SNAPSHOT_MAX_AGE_SECS")? {
            cfg.snapshot_max_age = Some(Duration::from_secs(secs));
        }
        if let Some(size) = parse_var::<u32>(&var, "WORKABLE_PAGE_SIZE")? {
            if size == 0 {
                return Err(ConfigError::Invalid {
                    var: "WORKABLE_PAGE_SIZE",
                    value: size.to_string(),
                });
            }
            cfg.page_size = size;
        }
        if let Some(secs) = parse_var::<u64>(&var, "WORKABLE_REQUEST_TIMEOUT_SECS")? {
            cfg.request_timeout = Duration::from_secs(secs);
        }
        if let Some(ms) = parse_var::<u64>(&var, "WORKABLE_PAGE_DELAY_MS")? {
            cfg.page_delay = Duration::from_millis(ms);
        }
        if let Some(secs) = parse_var::<u64>(&var, "WORKABLE_CACHE_TTL_SECS")? {
            cfg.cache_ttl = Duration::from_secs(secs);
        }
        cfg.default_member_id = var("WORKABLE_MEMBER_ID");
        cfg.roles_path = var("GIGABRANDS_ROLES_PATH").map(PathBuf::from);
        if let Some(fmt) = var("GIGABRANDS_LOG_FORMAT") {
            cfg.log_format = match fmt.to_ascii_lowercase().as_str() {
                "text" => LogFormat::Text,
                "json" => LogFormat::Json,
                _ => {
                    return Err(ConfigError::Invalid {
                        var: "GIGABRANDS_LOG_FORMAT",
                        value: fmt,
                    })
                }
            };
        }

        Ok(cfg)
    }
}

fn api_base_for(subdomain: &str) -> String {
    format!("https://{subdomain}.workable.com/spi/v3")
}

fn profile_base_for(subdomain: &str) -> String {
    format!("https://{subdomain}.workable.com/backend/candidates/db/profile/")
}

fn parse_var<T: FromStr>(
    var: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<Option<T>, ConfigError> {
    match var(name) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::Invalid {
                var: name,
                value: raw,
            }),
    }
}
