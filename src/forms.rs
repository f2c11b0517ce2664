use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::task::Priority;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    fn new(field: &str, message: &str) -> FieldError {
        FieldError {
            field: field.to_string(),
            message: message.to_string(),
        }
    }
}

/// 400 payload carrying field-level validation messages.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationErrorBody {
    pub success: bool,
    pub message: String,
    pub errors: Vec<FieldError>,
}

impl ValidationErrorBody {
    pub fn new(errors: Vec<FieldError>) -> ValidationErrorBody {
        ValidationErrorBody {
            success: false,
            message: "Validation failed".to_string(),
            errors,
        }
    }
}

/// A worker may edit exactly one profile: their own.
pub fn may_edit_worker(current_worker_id: i32, target_worker_id: i32) -> bool {
    current_worker_id == target_worker_id
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

fn looks_like_email(value: &str) -> bool {
    match value.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty() && !domain.contains('@'),
        None => false,
    }
}

/// Task create/update payload as submitted. Dates travel as strings so a
/// malformed date becomes a field error instead of a deserialize failure.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskForm {
    pub name: String,
    pub description: String,
    pub deadline: String,
    pub priority: Option<String>,
    pub task_type_id: Option<i32>,
    #[serde(default)]
    pub assignee_ids: Vec<i32>,
    #[serde(default)]
    pub is_completed: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedTask {
    pub name: String,
    pub description: String,
    pub deadline: NaiveDate,
    pub priority: Priority,
    pub task_type_id: Option<i32>,
    pub assignee_ids: Vec<i32>,
    pub is_completed: bool,
}

impl TaskForm {
    pub fn validate(&self) -> Result<ValidatedTask, Vec<FieldError>> {
        let mut errors = Vec::new();

        if is_blank(&self.name) {
            errors.push(FieldError::new("name", "Task name is required"));
        }
        if is_blank(&self.description) {
            errors.push(FieldError::new("description", "Task description is required"));
        }

        let deadline = match NaiveDate::parse_from_str(self.deadline.trim(), "%Y-%m-%d") {
            Ok(date) => Some(date),
            Err(_) => {
                errors.push(FieldError::new(
                    "deadline",
                    "Deadline must be a valid date (YYYY-MM-DD)",
                ));
                None
            }
        };

        let priority = match self.priority.as_deref() {
            None | Some("") => Some(Priority::default()),
            Some(value) => {
                let parsed = Priority::parse(value);
                if parsed.is_none() {
                    errors.push(FieldError::new(
                        "priority",
                        "Priority must be one of: urgent, high, medium, low",
                    ));
                }
                parsed
            }
        };

        let (Some(deadline), Some(priority)) = (deadline, priority) else {
            return Err(errors);
        };
        if !errors.is_empty() {
            return Err(errors);
        }

        let mut assignee_ids = self.assignee_ids.clone();
        assignee_ids.sort_unstable();
        assignee_ids.dedup();

        Ok(ValidatedTask {
            name: self.name.trim().to_string(),
            description: self.description.trim().to_string(),
            deadline,
            priority,
            task_type_id: self.task_type_id,
            assignee_ids,
            is_completed: self.is_completed,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterForm {
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub email: String,
    pub password: String,
}

impl RegisterForm {
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();

        if is_blank(&self.username) {
            errors.push(FieldError::new("username", "Username is required"));
        }
        if is_blank(&self.email) {
            errors.push(FieldError::new("email", "Email is required"));
        } else if !looks_like_email(self.email.trim()) {
            errors.push(FieldError::new("email", "Enter a valid email address"));
        }
        if self.password.len() < 8 {
            errors.push(FieldError::new(
                "password",
                "Password must be at least 8 characters",
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Self-service profile edit; the password is managed separately.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkerProfileForm {
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub email: String,
    pub position_id: Option<i32>,
}

impl WorkerProfileForm {
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();

        if is_blank(&self.username) {
            errors.push(FieldError::new("username", "Username is required"));
        }
        if is_blank(&self.email) {
            errors.push(FieldError::new("email", "Email is required"));
        } else if !looks_like_email(self.email.trim()) {
            errors.push(FieldError::new("email", "Enter a valid email address"));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task_form() -> TaskForm {
        TaskForm {
            name: "Rotate credentials".into(),
            description: "All service accounts".into(),
            deadline: "2024-07-01".into(),
            priority: Some("high".into()),
            task_type_id: Some(2),
            assignee_ids: vec![3, 1, 3],
            is_completed: false,
        }
    }

    #[test]
    fn valid_task_form_passes_and_dedupes_assignees() {
        let validated = task_form().validate().unwrap();
        assert_eq!(validated.priority, Priority::High);
        assert_eq!(validated.assignee_ids, vec![1, 3]);
        assert_eq!(
            validated.deadline,
            NaiveDate::from_ymd_opt(2024, 7, 1).unwrap()
        );
    }

    #[test]
    fn missing_priority_defaults_to_medium() {
        let mut form = task_form();
        form.priority = None;
        assert_eq!(form.validate().unwrap().priority, Priority::Medium);
        form.priority = Some(String::new());
        assert_eq!(form.validate().unwrap().priority, Priority::Medium);
    }

    #[test]
    fn blank_fields_and_bad_date_are_field_errors() {
        let mut form = task_form();
        form.name = "   ".into();
        form.deadline = "12/31/2024".into();
        let errors = form.validate().unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["name", "deadline"]);
    }

    #[test]
    fn unknown_priority_is_rejected() {
        let mut form = task_form();
        form.priority = Some("critical".into());
        let errors = form.validate().unwrap_err();
        assert_eq!(errors[0].field, "priority");
    }

    #[test]
    fn register_form_checks_email_and_password_length() {
        let form = RegisterForm {
            username: "jdoe".into(),
            first_name: String::new(),
            last_name: String::new(),
            email: "not-an-email".into(),
            password: "short".into(),
        };
        let errors = form.validate().unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["email", "password"]);

        let form = RegisterForm {
            email: "jdoe@example.com".into(),
            password: "longenough".into(),
            ..form
        };
        assert!(form.validate().is_ok());
    }

    #[test]
    fn profile_edit_is_owner_only() {
        assert!(may_edit_worker(7, 7));
        assert!(!may_edit_worker(7, 8));
    }
}
