//! Derived views over an already-fetched candidate list.
//! Everything here is pure: no IO, no upstream calls.

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;

use super::{Candidate, CandidateSource, Job};
use crate::roles::{index_by_lowercase_name, RoleInterviewers};

/// Raw stage label that marks a candidate as awaiting CEO review.
/// Matched exactly and case-sensitively against the upstream label.
pub const CEO_REVIEW_STAGE: &str = "CEO Review";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CeoReviewCandidate {
    pub id: String,
    pub name: String,
    pub email: String,
    pub job_title: String,
    pub job_shortcode: String,
    pub source: CandidateSource,
    pub created_at: String,
    pub workable_url: String,
    pub technical_interviewer: Option<String>,
    pub final_interviewer: Option<String>,
}

/// Candidate counts keyed by source, then normalized stage.
/// Both sources are always present, even when empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SourceStageCounts {
    pub linkedin_ads: BTreeMap<String, u32>,
    pub headhunting: BTreeMap<String, u32>,
}

impl SourceStageCounts {
    fn bucket_mut(&mut self, source: CandidateSource) -> &mut BTreeMap<String, u32> {
        match source {
            CandidateSource::LinkedinAds => &mut self.linkedin_ads,
            CandidateSource::Headhunting => &mut self.headhunting,
        }
    }

    pub fn count(&self, source: CandidateSource, stage: &str) -> u32 {
        let bucket = match source {
            CandidateSource::LinkedinAds => &self.linkedin_ads,
            CandidateSource::Headhunting => &self.headhunting,
        };
        bucket.get(stage).copied().unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobMetrics {
    pub job_id: String,
    pub job_title: String,
    pub job_shortcode: String,
    pub job_state: String,
    pub metrics: SourceStageCounts,
    pub total_candidates: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleMetrics {
    pub job_titles: Vec<String>,
    pub metrics: SourceStageCounts,
    pub total_candidates: usize,
}

/// Candidates in the CEO review stage, joined to their role's interviewers
/// by case-insensitive job title. Unmatched roles leave interviewers empty.
pub fn ceo_review_candidates(
    candidates: &[Candidate],
    roles: &[RoleInterviewers],
    profile_base_url: &str,
) -> Vec<CeoReviewCandidate> {
    let by_name = index_by_lowercase_name(roles);

    candidates
        .iter()
        .filter(|c| c.stage == CEO_REVIEW_STAGE)
        .map(|c| {
            let role = by_name.get(&c.job.title.to_lowercase());
            CeoReviewCandidate {
                id: c.id.clone(),
                name: c.name.clone(),
                email: c.email.clone(),
                job_title: c.job.title.clone(),
                job_shortcode: c.job.shortcode.clone(),
                source: c.source(),
                created_at: c.created_at.clone(),
                workable_url: c
                    .profile_url
                    .clone()
                    .filter(|u| !u.is_empty())
                    .unwrap_or_else(|| format!("{profile_base_url}{}", c.id)),
                technical_interviewer: role.and_then(|r| r.technical_interviewer.clone()),
                final_interviewer: role.and_then(|r| r.final_interviewer.clone()),
            }
        })
        .collect()
}

/// Group candidates by source and normalized stage.
pub fn stage_breakdown<'a>(candidates: impl IntoIterator<Item = &'a Candidate>) -> SourceStageCounts {
    let mut counts = SourceStageCounts::default();
    for c in candidates {
        *counts
            .bucket_mut(c.source())
            .entry(c.normalized_stage())
            .or_insert(0) += 1;
    }
    counts
}

/// One record per job, matching candidates by job shortcode.
pub fn job_metrics(jobs: &[Job], candidates: &[Candidate]) -> Vec<JobMetrics> {
    jobs.iter()
        .map(|job| {
            let matching: Vec<&Candidate> = candidates
                .iter()
                .filter(|c| c.job.shortcode == job.shortcode)
                .collect();
            JobMetrics {
                job_id: job.id.clone(),
                job_title: job.title.clone(),
                job_shortcode: job.shortcode.clone(),
                job_state: job.state.clone(),
                total_candidates: matching.len(),
                metrics: stage_breakdown(matching),
            }
        })
        .collect()
}

/// Aggregate over every job whose title matches one of `mapped_titles`
/// (case-insensitive). Returns None when no job matches at all.
pub fn role_metrics(
    jobs: &[Job],
    candidates: &[Candidate],
    mapped_titles: &[String],
) -> Option<RoleMetrics> {
    let wanted: HashSet<String> = mapped_titles.iter().map(|t| t.to_lowercase()).collect();
    let matching_jobs: Vec<&Job> = jobs
        .iter()
        .filter(|j| wanted.contains(&j.title.to_lowercase()))
        .collect();
    if matching_jobs.is_empty() {
        return None;
    }

    let shortcodes: HashSet<&str> = matching_jobs.iter().map(|j| j.shortcode.as_str()).collect();
    let matching: Vec<&Candidate> = candidates
        .iter()
        .filter(|c| shortcodes.contains(c.job.shortcode.as_str()))
        .collect();

    Some(RoleMetrics {
        job_titles: matching_jobs.iter().map(|j| j.title.clone()).collect(),
        total_candidates: matching.len(),
        metrics: stage_breakdown(matching),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workable::testing::{candidate, job};

    const PROFILE: &str = "https://acme.workable.com/backend/candidates/db/profile/";

    fn role(name: &str, tech: Option<&str>, fin: Option<&str>) -> RoleInterviewers {
        RoleInterviewers {
            role_name: name.to_string(),
            technical_interviewer: tech.map(str::to_string),
            final_interviewer: fin.map(str::to_string),
        }
    }

    #[test]
    fn ceo_review_joins_roles_case_insensitively() {
        let candidates = vec![
            candidate("1", "Brand Manager", "BM", "CEO Review", true),
            candidate("2", "Brand Manager", "BM", "Applied", false),
            candidate("3", "Designer", "DS", "CEO Review", false),
        ];
        let roles = vec![role("brand manager", Some("Alice"), Some("Zed"))];

        let out = ceo_review_candidates(&candidates, &roles, PROFILE);

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].id, "1");
        assert_eq!(out[0].technical_interviewer.as_deref(), Some("Alice"));
        assert_eq!(out[0].final_interviewer.as_deref(), Some("Zed"));
        assert_eq!(out[0].source, CandidateSource::Headhunting);
        assert_eq!(out[1].technical_interviewer, None);
        assert_eq!(out[1].final_interviewer, None);
    }

    #[test]
    fn ceo_review_stage_match_is_exact() {
        let candidates = vec![
            candidate("1", "Dev", "DEV", "ceo review", false),
            candidate("2", "Dev", "DEV", "CEO Review ", false),
        ];
        assert!(ceo_review_candidates(&candidates, &[], PROFILE).is_empty());
    }

    #[test]
    fn workable_url_prefers_profile_url() {
        let mut with_url = candidate("1", "Dev", "DEV", "CEO Review", false);
        with_url.profile_url = Some("https://x/profile/1".to_string());
        let without = candidate("2", "Dev", "DEV", "CEO Review", false);

        let out = ceo_review_candidates(&[with_url, without], &[], PROFILE);
        assert_eq!(out[0].workable_url, "https://x/profile/1");
        assert_eq!(out[1].workable_url, format!("{PROFILE}2"));
    }

    #[test]
    fn breakdown_groups_by_source_and_stage() {
        let candidates = vec![
            candidate("1", "Dev", "DEV", "Applied", false),
            candidate("2", "Dev", "DEV", "Applied", false),
            candidate("3", "Dev", "DEV", "Processing", false),
            candidate("4", "Dev", "DEV", "Offer Sent", true),
        ];
        let counts = stage_breakdown(&candidates);
        assert_eq!(counts.count(CandidateSource::LinkedinAds, "applied"), 2);
        assert_eq!(counts.count(CandidateSource::LinkedinAds, "ci_passed"), 1);
        assert_eq!(counts.count(CandidateSource::Headhunting, "offer_sent"), 1);
        assert_eq!(counts.count(CandidateSource::Headhunting, "applied"), 0);
    }

    #[test]
    fn job_without_candidates_still_reported() {
        let jobs = vec![job("Dev", "DEV"), job("Ops", "OPS")];
        let candidates = vec![candidate("1", "Dev", "DEV", "Applied", false)];

        let out = job_metrics(&jobs, &candidates);

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].total_candidates, 1);
        assert_eq!(out[1].job_shortcode, "OPS");
        assert_eq!(out[1].total_candidates, 0);
        assert_eq!(out[1].metrics, SourceStageCounts::default());
    }

    #[test]
    fn role_metrics_spans_mapped_jobs() {
        let jobs = vec![
            job("Brand Manager", "BM1"),
            job("Brand Manager (Greece)", "BM2"),
            job("Ops", "OPS"),
        ];
        let candidates = vec![
            candidate("1", "Brand Manager", "BM1", "Applied", false),
            candidate("2", "Brand Manager (Greece)", "BM2", "Applied", true),
            candidate("3", "Ops", "OPS", "Applied", false),
        ];
        let titles = vec!["brand manager".to_string(), "BRAND MANAGER (GREECE)".to_string()];

        let out = role_metrics(&jobs, &candidates, &titles).unwrap();

        assert_eq!(out.job_titles, vec!["Brand Manager", "Brand Manager (Greece)"]);
        assert_eq!(out.total_candidates, 2);
        assert_eq!(out.metrics.count(CandidateSource::Headhunting, "applied"), 1);
    }

    #[test]
    fn role_metrics_zero_candidates_vs_no_jobs() {
        let jobs = vec![job("Dev", "DEV")];
        let zero = role_metrics(&jobs, &[], &["dev".to_string()]).unwrap();
        assert_eq!(zero.total_candidates, 0);

        assert!(role_metrics(&jobs, &[], &["Designer".to_string()]).is_none());
    }

    #[test]
    fn serialized_shape_is_camel_case() {
        let out = ceo_review_candidates(
            &[candidate("1", "Dev", "DEV", "CEO Review", false)],
            &[],
            PROFILE,
        );
        let json = serde_json::to_value(&out[0]).unwrap();
        assert_eq!(json["jobTitle"], "Dev");
        assert_eq!(json["source"], "linkedin_ads");
        assert!(json["technicalInterviewer"].is_null());
    }
}
