// src/models/mod.rs

pub mod position;
pub mod session;
pub mod task;
pub mod task_type;
pub mod worker;
