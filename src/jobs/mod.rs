// src/jobs/mod.rs

pub mod models;
pub mod store;
