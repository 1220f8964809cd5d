//! Consumer-facing hiring operations built on the fetcher and the pure views.

use std::sync::Arc;

use tracing::{info, warn};

use super::fetcher::CandidateFetcher;
use super::views::{self, CeoReviewCandidate, JobMetrics, RoleMetrics};
use super::{WorkableApi, WorkableError};
use crate::roles::RoleSource;

pub struct HiringService<A> {
    api: Arc<A>,
    fetcher: Arc<CandidateFetcher<A>>,
    roles: Arc<dyn RoleSource>,
    profile_base_url: String,
}

impl<A: WorkableApi> HiringService<A> {
    pub fn new(
        api: Arc<A>,
        fetcher: Arc<CandidateFetcher<A>>,
        roles: Arc<dyn RoleSource>,
        profile_base_url: impl Into<String>,
    ) -> Self {
        Self {
            api,
            fetcher,
            roles,
            profile_base_url: profile_base_url.into(),
        }
    }

    /// Per-job stage breakdown for every upstream job.
    pub async fn sync_job_metrics(
        &self,
        force_refresh: bool,
    ) -> Result<Vec<JobMetrics>, WorkableError> {
        let jobs = self.api.list_jobs().await?;
        let candidates = self.fetcher.fetch_all_candidates(!force_refresh).await?;
        let metrics = views::job_metrics(&jobs, &candidates);
        info!(jobs = metrics.len(), candidates = candidates.len(), "job metrics computed");
        Ok(metrics)
    }

    /// Stage breakdown for one dashboard role, spanning every mapped Workable job.
    /// `Ok(None)` when none of the mapped titles exists upstream.
    pub async fn sync_role_metrics(
        &self,
        role_id: i64,
        mapped_job_titles: &[String],
        force_refresh: bool,
    ) -> Result<Option<RoleMetrics>, WorkableError> {
        let jobs = self.api.list_jobs().await?;
        let candidates = self.fetcher.fetch_all_candidates(!force_refresh).await?;
        let metrics = views::role_metrics(&jobs, &candidates, mapped_job_titles);
        if metrics.is_none() {
            warn!(role_id, mappings = ?mapped_job_titles, "no Workable jobs found for role");
        }
        Ok(metrics)
    }

    /// Candidates awaiting CEO review, read from cache only.
    /// A cold cache yields an empty list; populating it is the sync path's job.
    pub async fn ceo_review_candidates(&self) -> Vec<CeoReviewCandidate> {
        let Some(candidates) = self.fetcher.cached_candidates().await else {
            warn!("candidate cache is empty, run a sync first");
            return Vec::new();
        };
        let roles = self.roles.roles();
        let out = views::ceo_review_candidates(&candidates, &roles, &self.profile_base_url);
        info!(
            total = candidates.len(),
            in_review = out.len(),
            "CEO review candidates selected"
        );
        out
    }
}
