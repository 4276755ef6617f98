// src/matching/routes.rs

use axum::{routing::get, Router};

use crate::matching::handlers;

pub fn matching_routes() -> Router {
    Router::new().route(
        "/api/admin/jobs/:job_id/match-talents",
        get(handlers::match_talents),
    )
}
