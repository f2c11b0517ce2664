use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::filters::{FilterOption, TaskFilter, ALL};
use crate::models::task::{Priority, TaskRecord};
use crate::models::worker::Worker;

/// Query-string parameters of GET /tasks/.
#[derive(Debug, Deserialize)]
pub struct TaskListQuery {
    pub search: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub task_type: Option<String>,
    pub deadline_filter: Option<String>,
    pub assignee: Option<String>,
    pub page: Option<usize>,
}

impl TaskListQuery {
    pub fn filter(&self) -> TaskFilter {
        TaskFilter {
            search: self.search.clone(),
            status: self.status.clone(),
            priority: self.priority.clone(),
            task_type: self.task_type.clone(),
            deadline_filter: self.deadline_filter.clone(),
            assignee: self.assignee.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AssigneeInfo {
    pub worker_id: i32,
    pub username: String,
    pub display_name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TaskItem {
    pub task_id: i32,
    pub name: String,
    pub description: String,
    pub deadline: NaiveDate,
    pub is_completed: bool,
    pub priority: Priority,
    pub task_type: Option<String>,
    pub assignees: Vec<AssigneeInfo>,
}

impl TaskItem {
    pub fn from_record(record: &TaskRecord, workers: &HashMap<i32, Worker>) -> TaskItem {
        let assignees = record
            .assignee_ids
            .iter()
            .filter_map(|id| workers.get(id))
            .map(|worker| AssigneeInfo {
                worker_id: worker.worker_id,
                username: worker.username.clone(),
                display_name: worker.display_name(),
            })
            .collect();

        TaskItem {
            task_id: record.task_id,
            name: record.name.clone(),
            description: record.description.clone(),
            deadline: record.deadline,
            is_completed: record.is_completed,
            priority: record.priority,
            task_type: record.task_type_name.clone(),
            assignees,
        }
    }
}

/// The filter form state echoed back for redisplay.
#[derive(Debug, Serialize)]
pub struct TaskFilterState {
    pub search: String,
    pub status: String,
    pub priority: String,
    pub task_type: String,
    pub deadline_filter: String,
    pub assignee: String,
}

impl TaskFilterState {
    pub fn from_query(query: &TaskListQuery) -> TaskFilterState {
        let echo = |value: &Option<String>| -> String {
            match value {
                Some(v) if !v.is_empty() => v.clone(),
                _ => ALL.to_string(),
            }
        };
        TaskFilterState {
            search: query.search.clone().unwrap_or_default(),
            status: echo(&query.status),
            priority: echo(&query.priority),
            task_type: echo(&query.task_type),
            deadline_filter: echo(&query.deadline_filter),
            assignee: echo(&query.assignee),
        }
    }
}

#[derive(Serialize)]
pub struct TaskListResponse {
    pub tasks: Vec<TaskItem>,
    pub page: usize,
    pub per_page: usize,
    pub total_count: usize,
    pub total_pages: usize,
    pub active_filter_count: usize,
    pub filters: TaskFilterState,
    pub status_options: Vec<FilterOption>,
    pub priority_options: Vec<FilterOption>,
    pub deadline_options: Vec<FilterOption>,
    pub task_type_options: Vec<FilterOption>,
    pub assignee_options: Vec<FilterOption>,
}

/// Options for the create/update forms (no "all" entries).
#[derive(Serialize)]
pub struct TaskFormContext {
    pub priority_options: Vec<FilterOption>,
    pub task_type_options: Vec<FilterOption>,
    pub assignee_options: Vec<FilterOption>,
    pub task: Option<TaskItem>,
}

#[derive(Serialize)]
pub struct TaskDetailResponse {
    pub task: TaskItem,
}

#[derive(Serialize)]
pub struct TaskMutationResponse {
    pub success: bool,
    pub message: String,
    pub task_id: Option<i32>,
}

fn option(value: &str, label: &str) -> FilterOption {
    FilterOption {
        value: value.to_string(),
        label: label.to_string(),
    }
}

pub fn status_options() -> Vec<FilterOption> {
    vec![
        option("all", "All"),
        option("completed", "Completed"),
        option("pending", "Pending"),
    ]
}

pub fn priority_options() -> Vec<FilterOption> {
    Priority::ALL
        .iter()
        .map(|p| {
            let label = match p {
                Priority::Urgent => "Urgent",
                Priority::High => "High",
                Priority::Medium => "Medium",
                Priority::Low => "Low",
            };
            option(p.as_str(), label)
        })
        .collect()
}

pub fn deadline_options() -> Vec<FilterOption> {
    vec![
        option("all", "All"),
        option("today", "Today"),
        option("next_3_days", "Next 3 days"),
        option("next_week", "Next week"),
        option("overdue", "Overdue"),
    ]
}
