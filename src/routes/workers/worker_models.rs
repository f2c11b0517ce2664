use serde::{Deserialize, Serialize};

use crate::filters::{FilterOption, WorkerFilter, ALL};
use crate::models::worker::Worker;
use crate::routes::tasks::task_models::TaskItem;

/// Query-string parameters of GET /workers/.
#[derive(Debug, Deserialize)]
pub struct WorkerListQuery {
    pub search: Option<String>,
    pub position: Option<String>,
    pub page: Option<usize>,
}

impl WorkerListQuery {
    pub fn filter(&self) -> WorkerFilter {
        WorkerFilter {
            search: self.search.clone(),
            position: self.position.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkerItem {
    pub worker_id: i32,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub position: Option<String>,
}

impl WorkerItem {
    pub fn from_worker(worker: &Worker, position: Option<String>) -> WorkerItem {
        WorkerItem {
            worker_id: worker.worker_id,
            username: worker.username.clone(),
            first_name: worker.first_name.clone(),
            last_name: worker.last_name.clone(),
            email: worker.email.clone(),
            position,
        }
    }
}

#[derive(Serialize)]
pub struct WorkerListResponse {
    pub workers: Vec<WorkerItem>,
    pub page: usize,
    pub per_page: usize,
    pub total_count: usize,
    pub total_pages: usize,
    pub search: String,
    pub position: String,
    pub position_options: Vec<FilterOption>,
}

impl WorkerListResponse {
    pub fn echo(value: &Option<String>) -> String {
        match value {
            Some(v) if !v.is_empty() => v.clone(),
            _ => ALL.to_string(),
        }
    }
}

#[derive(Serialize)]
pub struct WorkerDetailResponse {
    pub worker: WorkerItem,
    pub completed_count: usize,
    pub pending_count: usize,
    pub completed_tasks: Vec<TaskItem>,
    pub pending_tasks: Vec<TaskItem>,
}

/// GET /workers/{id}/update/ — current values plus position options.
#[derive(Serialize)]
pub struct WorkerFormContext {
    pub worker: WorkerItem,
    pub position_options: Vec<FilterOption>,
}

#[derive(Serialize)]
pub struct WorkerMutationResponse {
    pub success: bool,
    pub message: String,
}
