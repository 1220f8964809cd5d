//! Workable SPI v3 client.
//! One pooled reqwest client with a per-request timeout; bearer auth on every
//! call. No retries: every failure goes straight back to the caller.

use std::time::Duration;

use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use super::{
    Activity, CandidateComment, CandidateDetails, CandidatePage, Job, WorkableApi, WorkableError,
};
use crate::config::WorkableConfig;

pub struct WorkableClient {
    http: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
    default_member_id: Option<String>,
    timeout: Duration,
}

impl WorkableClient {
    /// Build the client. A missing API key is not an error here; it is
    /// reported by the first call that needs the network.
    pub fn new(config: &WorkableConfig) -> Result<Self, WorkableError> {
        let http = reqwest::Client::builder()
            .pool_max_idle_per_host(4)
            .pool_idle_timeout(Duration::from_secs(90))
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| WorkableError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            api_key: config.api_key.clone(),
            base_url: config.base_url.clone(),
            default_member_id: config.default_member_id.clone(),
            timeout: config.request_timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, url: &str) -> Result<RequestBuilder, WorkableError> {
        let key = self.api_key.as_deref().ok_or(WorkableError::MissingApiKey)?;
        Ok(self
            .http
            .request(method, url)
            .header("Authorization", format!("Bearer {key}"))
            .header("Content-Type", "application/json"))
    }

    /// Send and require a 2xx. Non-success statuses carry status text and body.
    async fn send(&self, req: RequestBuilder) -> Result<Response, WorkableError> {
        let resp = req.send().await.map_err(|e| self.transport_err(e))?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(WorkableError::Upstream {
            status: status
                .canonical_reason()
                .map(str::to_string)
                .unwrap_or_else(|| status.as_u16().to_string()),
            body,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, WorkableError> {
        let resp = self.send(self.request(Method::GET, url)?).await?;
        resp.json::<T>().await.map_err(|e| self.transport_err(e))
    }

    fn transport_err(&self, e: reqwest::Error) -> WorkableError {
        if e.is_timeout() {
            WorkableError::Timeout {
                secs: self.timeout.as_secs(),
            }
        } else if e.is_decode() {
            WorkableError::Decode(e.to_string())
        } else {
            WorkableError::Transport(e.to_string())
        }
    }

    /// Move a candidate to `target_stage` (a stage slug such as `set_interview`).
    pub async fn move_candidate_to_stage(
        &self,
        candidate_id: &str,
        target_stage: &str,
        member_id: Option<&str>,
    ) -> Result<(), WorkableError> {
        let member_id = member_id
            .or(self.default_member_id.as_deref())
            .ok_or(WorkableError::MissingMemberId)?;
        let url = format!("{}/candidates/{candidate_id}/move", self.base_url);
        let body = serde_json::json!({
            "member_id": member_id,
            "target_stage": target_stage,
        });
        self.send(self.request(Method::POST, &url)?.json(&body))
            .await?;
        debug!(candidate_id, target_stage, "candidate moved");
        Ok(())
    }

    /// Replace a candidate's tags.
    pub async fn update_candidate_tags(
        &self,
        candidate_id: &str,
        tags: &[String],
    ) -> Result<(), WorkableError> {
        let url = format!("{}/candidates/{candidate_id}/tags", self.base_url);
        let body = serde_json::json!({ "tags": tags });
        self.send(self.request(Method::PUT, &url)?.json(&body))
            .await?;
        debug!(candidate_id, tags = tags.len(), "candidate tags updated");
        Ok(())
    }

    /// Move to `set_interview`, then tag the candidate with the interviewer's name.
    pub async fn schedule_interview_with_tag(
        &self,
        candidate_id: &str,
        interviewer_name: &str,
        member_id: Option<&str>,
    ) -> Result<(), WorkableError> {
        self.move_candidate_to_stage(candidate_id, "set_interview", member_id)
            .await?;
        self.update_candidate_tags(candidate_id, &[interviewer_name.to_string()])
            .await
    }

    pub async fn fetch_candidate_activities(
        &self,
        candidate_id: &str,
        actions_filter: Option<&str>,
    ) -> Result<Vec<Activity>, WorkableError> {
        let mut url = format!("{}/candidates/{candidate_id}/activities", self.base_url);
        if let Some(actions) = actions_filter {
            url.push_str("?actions=");
            url.push_str(actions);
        }
        let resp: ActivitiesResponse = self.get_json(&url).await?;
        Ok(resp.activities)
    }

    pub async fn fetch_candidate_comments(
        &self,
        candidate_id: &str,
    ) -> Result<Vec<CandidateComment>, WorkableError> {
        let activities = self
            .fetch_candidate_activities(candidate_id, Some("comment"))
            .await?;
        Ok(activities.into_iter().map(comment_from_activity).collect())
    }

    pub async fn fetch_candidate_details(
        &self,
        candidate_id: &str,
    ) -> Result<CandidateDetails, WorkableError> {
        let url = format!("{}/candidates/{candidate_id}", self.base_url);
        let raw: RawCandidateDetails = self.get_json(&url).await?;
        Ok(CandidateDetails {
            id: raw.id,
            name: raw.name,
            email: raw.email,
            phone: raw.phone,
            resume_url: raw.resume_url,
            cover_letter: raw.cover_letter,
            headline: raw.headline,
            summary: raw.summary,
        })
    }
}

impl WorkableApi for WorkableClient {
    async fn candidate_page(&self, url: &str) -> Result<CandidatePage, WorkableError> {
        self.get_json(url).await
    }

    async fn list_jobs(&self) -> Result<Vec<Job>, WorkableError> {
        let url = format!("{}/jobs", self.base_url);
        let resp: JobsResponse = self.get_json(&url).await?;
        Ok(resp.jobs)
    }
}

fn comment_from_activity(activity: Activity) -> CandidateComment {
    let member = activity.member.unwrap_or_default();
    let id = match activity.id {
        Some(id) => id,
        None => format!(
            "{}-{}",
            activity.created_at.as_deref().unwrap_or_default(),
            member.id.as_deref().unwrap_or_default()
        ),
    };
    CandidateComment {
        id,
        body: activity.body.unwrap_or_default(),
        author: member.name.unwrap_or_else(|| "Unknown".to_string()),
        created_at: activity
            .created_at
            .unwrap_or_else(|| chrono::Utc::now().to_rfc3339()),
    }
}

#[derive(Deserialize)]
struct JobsResponse {
    #[serde(default)]
    jobs: Vec<Job>,
}

#[derive(Deserialize)]
struct ActivitiesResponse {
    #[serde(default)]
    activities: Vec<Activity>,
}

#[derive(Deserialize)]
struct RawCandidateDetails {
    id: String,
    name: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    resume_url: Option<String>,
    cover_letter: Option<String>,
    headline: Option<String>,
    summary: Option<String>,
}
