// src/routes/mod.rs

pub mod auth;
pub mod dashboard;
pub mod routes;
pub mod tasks;
pub mod workers;
