// src/jobs/models.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// ============================================================================
// Job Models
// ============================================================================

#[derive(FromRow, Serialize, Deserialize, Debug, Clone)]
pub struct Job {
    pub id: String,
    pub title: String,
    pub company_name: String,
    pub role: String,
    pub department: Option<String>,
    pub country: Option<String>,
    pub experience: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skills: Option<String>, // JSON string in DB, will be parsed
    pub description: String,
    #[serde(skip_serializing)]
    pub embedding: Option<String>, // JSON array of floats, cached
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl Job {
    /// Required-skills set, stored as a JSON array string
    pub fn skills_list(&self) -> Vec<String> {
        self.skills
            .as_deref()
            .and_then(|s| serde_json::from_str::<Vec<String>>(s).ok())
            .unwrap_or_default()
    }

    /// Cached description embedding, if one has been computed
    pub fn embedding_vec(&self) -> Option<Vec<f32>> {
        self.embedding
            .as_deref()
            .and_then(|s| serde_json::from_str::<Vec<f32>>(s).ok())
            .filter(|v| !v.is_empty())
    }

    /// Canonical text fed to the embedding model for this posting
    pub fn embedding_text(&self) -> String {
        format!(
            "Job Title: {}\nExperience: {}\nRole: {}\nDepartment: {}\nLocation: {}\n\n**Must-Have Skills:** {}\n\nCompany: {}\n\nDescription:\n{}",
            self.title,
            self.experience.as_deref().unwrap_or(""),
            self.role,
            self.department.as_deref().unwrap_or(""),
            self.country.as_deref().unwrap_or(""),
            self.skills_list().join(", "),
            self.company_name,
            self.description,
        )
    }
}

/// Fields of a posting that invalidate the cached embedding when edited
#[derive(Deserialize, Debug)]
pub struct UpdateJobDetails {
    pub title: Option<String>,
    pub role: Option<String>,
    pub experience: Option<String>,
    pub skills: Option<Vec<String>>,
    pub description: Option<String>,
}
