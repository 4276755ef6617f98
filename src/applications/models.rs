// src/applications/models.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// ============================================================================
// Application Models
// ============================================================================

/// Application lifecycle status.
///
/// The matching pipeline only ever advances an application to `Shortlisted`;
/// the later stages belong to the hiring workflow and are never touched here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApplicationStatus {
    #[serde(rename = "Under Review")]
    UnderReview,
    Shortlisted,
    Interview,
    Hired,
    Declined,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::UnderReview => "Under Review",
            ApplicationStatus::Shortlisted => "Shortlisted",
            ApplicationStatus::Interview => "Interview",
            ApplicationStatus::Hired => "Hired",
            ApplicationStatus::Declined => "Declined",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Under Review" => Some(ApplicationStatus::UnderReview),
            "Shortlisted" => Some(ApplicationStatus::Shortlisted),
            "Interview" => Some(ApplicationStatus::Interview),
            "Hired" => Some(ApplicationStatus::Hired),
            "Declined" => Some(ApplicationStatus::Declined),
            _ => None,
        }
    }

    /// Statuses the pipeline must never overwrite: anything already past
    /// shortlisting, plus terminal decisions.
    pub fn is_protected(&self) -> bool {
        matches!(
            self,
            ApplicationStatus::Interview | ApplicationStatus::Hired | ApplicationStatus::Declined
        )
    }
}

#[derive(FromRow, Serialize, Deserialize, Debug)]
pub struct Application {
    pub id: String,
    pub job_id: String,
    pub talent_id: String,
    pub score: f64,
    pub status: String,
    pub feedback: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

/// One applicant row as the matching pipeline consumes it: the application
/// joined with the talent fields the scorers need.
#[derive(FromRow, Debug, Clone)]
pub struct JobApplicant {
    pub application_id: String,
    pub talent_id: String,
    pub profession: String,
    pub experience_years: Option<String>,
    pub resume_url: Option<String>,
    pub resume_embedding: Option<String>,
    pub status: String,
}

impl JobApplicant {
    pub fn resume_embedding_vec(&self) -> Option<Vec<f32>> {
        self.resume_embedding
            .as_deref()
            .and_then(|s| serde_json::from_str::<Vec<f32>>(s).ok())
            .filter(|v| !v.is_empty())
    }
}

/// Applicant as rendered in the terminal event's job view
#[derive(FromRow, Serialize, Debug)]
pub struct ApplicantView {
    pub application_id: String,
    pub talent_id: String,
    pub name: String,
    pub profession: String,
    pub score: f64,
    pub status: String,
    pub feedback: Option<String>,
    pub created_at: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_string_roundtrip() {
        for status in [
            ApplicationStatus::UnderReview,
            ApplicationStatus::Shortlisted,
            ApplicationStatus::Interview,
            ApplicationStatus::Hired,
            ApplicationStatus::Declined,
        ] {
            assert_eq!(ApplicationStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(ApplicationStatus::parse("shortlisted"), None);
    }

    #[test]
    fn test_protected_statuses() {
        assert!(!ApplicationStatus::UnderReview.is_protected());
        assert!(!ApplicationStatus::Shortlisted.is_protected());
        assert!(ApplicationStatus::Interview.is_protected());
        assert!(ApplicationStatus::Hired.is_protected());
        assert!(ApplicationStatus::Declined.is_protected());
    }
}
