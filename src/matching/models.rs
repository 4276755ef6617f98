// src/matching/models.rs

use serde::Serialize;

use crate::jobs::store::JobWithApplicants;

// ============================================================================
// Streaming Events
// ============================================================================

/// Pipeline stage identifiers as they appear on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStep {
    Init,
    Extract,
    Embed,
    Compare,
    Done,
    Error,
}

/// One server-push event of the matching run
#[derive(Serialize, Debug)]
pub struct MatchEvent {
    pub step: MatchStep,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matches: Option<Vec<MatchScore>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job: Option<JobWithApplicants>,
}

impl MatchEvent {
    pub fn progress(step: MatchStep) -> Self {
        Self {
            step,
            success: true,
            message: None,
            matches: None,
            job: None,
        }
    }

    pub fn failure(step: MatchStep, message: impl Into<String>) -> Self {
        Self {
            step,
            success: false,
            message: Some(message.into()),
            matches: None,
            job: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::failure(MatchStep::Error, message)
    }

    pub fn done(matches: Vec<MatchScore>, job: Option<JobWithApplicants>) -> Self {
        Self {
            step: MatchStep::Done,
            success: true,
            message: Some("Match complete".to_string()),
            matches: Some(matches),
            job,
        }
    }
}

#[derive(Serialize, Debug, Clone)]
pub struct MatchScore {
    pub talent_id: String,
    pub score: f64,
}

// ============================================================================
// Run-internal results
// ============================================================================

/// Per-signal breakdown for one applicant
#[derive(Debug, Clone, Copy)]
pub struct SignalScores {
    pub similarity: f64,
    pub keyword: f64,
    pub experience: f64,
    pub role: f64,
}

/// One applicant's outcome for a single matching run. Never persisted as a
/// whole; only score/status/feedback land on the application row.
#[derive(Debug)]
pub struct MatchResult {
    pub talent_id: String,
    pub resume_text: String,
    pub signals: SignalScores,
    pub score: f64,
}
