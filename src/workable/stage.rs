//! Stage normalization and source classification. Pure and total.

use std::sync::LazyLock;

use regex::Regex;

use super::{Candidate, CandidateSource};

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

/// Map an upstream stage label to the dashboard's stage key.
/// Known labels use the fixed table; anything else is lowercased with
/// whitespace runs turned into `_`.
pub fn map_stage(raw: &str) -> String {
    let known = match raw {
        "Applied" => "applied",
        "Processing" => "ci_passed",
        "CI Passed" => "ci_passed",
        "Screening Call" => "screening_call",
        "HR Interview" => "hr_interview",
        "HR Interview Conducted" => "hr_conducted",
        "Hiring Manager Feedback" => "hr_passed",
        "Hiring Manager Interview" => "hiring_manager",
        "CEO Review" => "ceo_review",
        _ => return WHITESPACE.replace_all(&raw.to_lowercase(), "_").into_owned(),
    };
    known.to_string()
}

/// Sourced candidates were headhunted; everyone else applied through ads.
pub fn classify_source(candidate: &Candidate) -> CandidateSource {
    if candidate.sourced {
        CandidateSource::Headhunting
    } else {
        CandidateSource::LinkedinAds
    }
}
