// src/applications/mod.rs

pub mod models;
pub mod store;
