// src/matching/mod.rs
//! Resume-to-job matching: extraction, embeddings, signal scoring and the
//! streaming orchestrator.

pub mod extract;
pub mod feedback;
pub mod handlers;
pub mod models;
pub mod pipeline;
pub mod routes;
pub mod scoring;

// Re-export commonly used items
pub use routes::matching_routes;
pub use scoring::ScoringConfig;
