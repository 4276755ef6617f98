// Application state shared across all modules

use reqwest::Client;
use sqlx::SqlitePool;
use std::collections::HashSet;
use std::sync::Arc;

use crate::matching::ScoringConfig;
use crate::services::CohereService;

/// Application state containing database pool, services, and configuration
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub http: Client,
    pub jwt_secret: String,
    pub admin_emails: HashSet<String>,
    pub cohere_service: Arc<CohereService>,
    pub scoring: ScoringConfig,
}
