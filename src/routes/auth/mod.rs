pub mod auth_handlers;
pub mod auth_models;
