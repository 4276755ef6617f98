// src/talents/mod.rs

pub mod models;
pub mod store;
