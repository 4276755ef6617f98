// Common module - shared types and utilities across all modules

pub mod error;
pub mod id_generator;
pub mod migrations;
pub mod state;

// Re-export commonly used types for convenience
pub use error::ApiError;
pub use id_generator::*;
pub use state::AppState;
