use serde::Serialize;

use crate::routes::tasks::task_models::TaskItem;
use crate::stats::{ChartData, TaskStats, WorkerLoad};

/// Stats and chart payloads for one scope (personal or team).
#[derive(Serialize)]
pub struct ScopeStats {
    pub stats: TaskStats,
    pub priority_chart: ChartData,
    pub type_chart: ChartData,
}

#[derive(Serialize)]
pub struct DashboardResponse {
    pub personal: ScopeStats,
    pub team: ScopeStats,
    pub upcoming_tasks: Vec<TaskItem>,
    pub urgent_tasks: Vec<TaskItem>,
    pub top_workers: Vec<WorkerLoad>,
}
