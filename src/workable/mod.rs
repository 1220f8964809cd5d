//! Workable integration: upstream types, the API seam, and the candidate
//! sync pipeline. A full fetch fills the memory cache and the disk snapshot,
//! and the derived views read from those.

pub mod client;
pub mod fetcher;
pub mod pacing;
pub mod service;
pub mod snapshot;
pub mod stage;
pub mod views;

use std::future::Future;

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Job reference embedded in every candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRef {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub shortcode: String,
}

/// Upstream sends explicit `null` for fields it has no value for (e.g. the
/// email of a sourced candidate). Treat it like a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Upstream candidate record. Fields not modelled here are kept in `extra`
/// so a snapshot round-trips the upstream object unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub email: String,
    pub job: JobRef,
    #[serde(default, deserialize_with = "null_as_default")]
    pub stage: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub sourced: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_url: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Candidate {
    pub fn source(&self) -> CandidateSource {
        stage::classify_source(self)
    }

    pub fn normalized_stage(&self) -> String {
        stage::map_stage(&self.stage)
    }
}

/// Where a candidate came from, derived from the `sourced` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateSource {
    LinkedinAds,
    Headhunting,
}

impl CandidateSource {
    pub fn as_str(self) -> &'static str {
        match self {
            CandidateSource::LinkedinAds => "linkedin_ads",
            CandidateSource::Headhunting => "headhunting",
        }
    }
}

impl std::fmt::Display for CandidateSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub title: String,
    pub shortcode: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub state: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Paging {
    #[serde(default)]
    pub next: Option<String>,
}

/// One page of `GET /candidates`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CandidatePage {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    pub paging: Option<Paging>,
}

impl CandidatePage {
    /// Continuation URL, if any. An empty string ends pagination too.
    pub fn next_url(&self) -> Option<&str> {
        self.paging
            .as_ref()
            .and_then(|p| p.next.as_deref())
            .filter(|n| !n.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivityMember {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Entry of a candidate's activity stream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub member: Option<ActivityMember>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateComment {
    pub id: String,
    pub body: String,
    pub author: String,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateDetails {
    pub id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub resume_url: Option<String>,
    pub cover_letter: Option<String>,
    pub headline: Option<String>,
    pub summary: Option<String>,
}

#[derive(Debug, Error)]
pub enum WorkableError {
    #[error("WORKABLE_API_KEY not configured")]
    MissingApiKey,
    #[error("no member id given and WORKABLE_MEMBER_ID not configured")]
    MissingMemberId,
    #[error("Workable API request timed out after {secs} seconds")]
    Timeout { secs: u64 },
    #[error("Workable API error: {status} - {body}")]
    Upstream { status: String, body: String },
    #[error("Workable transport error: {0}")]
    Transport(String),
    #[error("invalid Workable response: {0}")]
    Decode(String),
}

/// Read side of the upstream API used by the sync pipeline.
pub trait WorkableApi: Send + Sync {
    /// GET one page of candidates at an absolute URL (first page or `paging.next`).
    fn candidate_page(
        &self,
        url: &str,
    ) -> impl Future<Output = Result<CandidatePage, WorkableError>> + Send;

    fn list_jobs(&self) -> impl Future<Output = Result<Vec<Job>, WorkableError>> + Send;
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_with_null_fields_decodes() {
        let body = r#"{"candidates":[
            {"id":"9","name":"N","email":null,"job":{"id":"j","title":"T","shortcode":"S"},
             "stage":"Sourced","sourced":true,"created_at":"x"},
            {"id":"10","name":null,"email":"a@x","job":{"id":"j","title":null,"shortcode":"S"},
             "stage":null,"sourced":null,"created_at":null,"profile_url":null}
        ],"paging":null}"#;

        let page: CandidatePage = serde_json::from_str(body).unwrap();

        assert_eq!(page.candidates.len(), 2);
        assert_eq!(page.candidates[0].email, "");
        assert!(page.candidates[0].sourced);
        let second = &page.candidates[1];
        assert_eq!(second.name, "");
        assert_eq!(second.job.title, "");
        assert_eq!(second.stage, "");
        assert!(!second.sourced);
        assert_eq!(second.profile_url, None);
        assert_eq!(page.next_url(), None);
    }

    #[test]
    fn null_job_state_defaults_to_empty() {
        let job: Job =
            serde_json::from_str(r#"{"id":"1","title":"Dev","shortcode":"DEV","state":null}"#)
                .unwrap();
        assert_eq!(job.state, "");
    }
}
