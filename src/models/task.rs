use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Task priority, stored as a lowercase string in `Tasks_.priority`.
/// Variant order is display order, most pressing first.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Priority {
    Urgent,
    High,
    Medium,
    Low,
}

impl Priority {
    pub const ALL: [Priority; 4] = [
        Priority::Urgent,
        Priority::High,
        Priority::Medium,
        Priority::Low,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Urgent => "urgent",
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }

    pub fn parse(value: &str) -> Option<Priority> {
        match value {
            "urgent" => Some(Priority::Urgent),
            "high" => Some(Priority::High),
            "medium" => Some(Priority::Medium),
            "low" => Some(Priority::Low),
            _ => None,
        }
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Medium
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TaskRow {
    pub task_id: i32,
    pub name: String,
    pub description: String,
    pub deadline: NaiveDate,
    pub is_completed: bool,
    pub priority: Priority,
    pub task_type_id: Option<i32>,
}

/// A task row joined with its task-type name and assignee links.
/// One record per task id, so multi-assignee tasks never show up twice.
#[derive(Debug, Clone, Serialize)]
pub struct TaskRecord {
    pub task_id: i32,
    pub name: String,
    pub description: String,
    pub deadline: NaiveDate,
    pub is_completed: bool,
    pub priority: Priority,
    pub task_type_id: Option<i32>,
    pub task_type_name: Option<String>,
    pub assignee_ids: Vec<i32>,
}

impl TaskRecord {
    pub fn assemble(
        row: TaskRow,
        type_names: &HashMap<i32, String>,
        assignees: &HashMap<i32, Vec<i32>>,
    ) -> TaskRecord {
        let task_type_name = row
            .task_type_id
            .and_then(|id| type_names.get(&id).cloned());
        let assignee_ids = assignees.get(&row.task_id).cloned().unwrap_or_default();

        TaskRecord {
            task_id: row.task_id,
            name: row.name,
            description: row.description,
            deadline: row.deadline,
            is_completed: row.is_completed,
            priority: row.priority,
            task_type_id: row.task_type_id,
            task_type_name,
            assignee_ids,
        }
    }

    pub fn is_assigned_to(&self, worker_id: i32) -> bool {
        self.assignee_ids.contains(&worker_id)
    }
}
