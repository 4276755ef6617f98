// src/auth/mod.rs

pub mod extractors;
pub mod models;

// Re-export commonly used items
pub use extractors::AuthedAdmin;
