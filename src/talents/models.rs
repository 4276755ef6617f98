// src/talents/models.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(FromRow, Serialize, Deserialize, Debug, Clone)]
pub struct Talent {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub profession: String,
    /// Single number ("6") or a range ("2-4 years")
    pub experience_years: Option<String>,
    pub resume_url: Option<String>,
    #[serde(skip_serializing)]
    pub resume_embedding: Option<String>, // JSON array of floats, cached
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl Talent {
    /// Cached resume-text embedding, if one has been computed
    pub fn resume_embedding_vec(&self) -> Option<Vec<f32>> {
        self.resume_embedding
            .as_deref()
            .and_then(|s| serde_json::from_str::<Vec<f32>>(s).ok())
            .filter(|v| !v.is_empty())
    }
}
