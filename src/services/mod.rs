// src/services/mod.rs
//
// Shared services module containing remote-API clients
// that can be used across different domain modules

pub mod cohere;

// Re-export commonly used types for convenience
pub use cohere::{CohereError, CohereService, Embedder, TextGenerator};
