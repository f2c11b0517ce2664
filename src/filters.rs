use chrono::{Duration, NaiveDate};
use serde::Serialize;

use crate::models::position::Position;
use crate::models::task::{Priority, TaskRecord};
use crate::models::task_type::TaskType;
use crate::models::worker::Worker;

pub const PAGE_SIZE: usize = 20;

/// Marker for an unconstrained filter dimension in the query string.
pub const ALL: &str = "all";

fn is_unset(value: &Option<String>) -> bool {
    match value {
        None => true,
        Some(v) => v.is_empty() || v == ALL,
    }
}

/// Task-list filter dimensions, parsed straight from the query string.
/// Every dimension is optional; `"all"`, empty, or absent means
/// unconstrained. Dimensions combine with logical AND.
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub search: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub task_type: Option<String>,
    pub deadline_filter: Option<String>,
    pub assignee: Option<String>,
}

impl TaskFilter {
    pub fn matches(&self, task: &TaskRecord, today: NaiveDate) -> bool {
        if let Some(search) = &self.search {
            if !search.is_empty() {
                let needle = search.to_lowercase();
                let in_name = task.name.to_lowercase().contains(&needle);
                let in_description = task.description.to_lowercase().contains(&needle);
                if !in_name && !in_description {
                    return false;
                }
            }
        }

        if !is_unset(&self.status) {
            match self.status.as_deref() {
                Some("completed") if !task.is_completed => return false,
                Some("pending") if task.is_completed => return false,
                // unrecognized values constrain nothing
                _ => {}
            }
        }

        if !is_unset(&self.priority) {
            let wanted = self.priority.as_deref().and_then(Priority::parse);
            // an unknown priority value matches no task
            if wanted != Some(task.priority) {
                return false;
            }
        }

        if !is_unset(&self.task_type) {
            let wanted = self.task_type.as_deref().and_then(|v| v.parse::<i32>().ok());
            if wanted.is_none() || wanted != task.task_type_id {
                return false;
            }
        }

        if !is_unset(&self.deadline_filter) {
            match self.deadline_filter.as_deref() {
                Some("today") => {
                    if task.deadline != today {
                        return false;
                    }
                }
                Some("next_3_days") => {
                    if task.deadline < today || task.deadline > today + Duration::days(3) {
                        return false;
                    }
                }
                Some("next_week") => {
                    if task.deadline < today || task.deadline > today + Duration::days(7) {
                        return false;
                    }
                }
                Some("overdue") => {
                    if task.deadline >= today || task.is_completed {
                        return false;
                    }
                }
                _ => {}
            }
        }

        if !is_unset(&self.assignee) {
            match self.assignee.as_deref().and_then(|v| v.parse::<i32>().ok()) {
                Some(worker_id) if task.is_assigned_to(worker_id) => {}
                _ => return false,
            }
        }

        true
    }

    /// Filter then order by descending id (most recently created first).
    pub fn apply(&self, mut tasks: Vec<TaskRecord>, today: NaiveDate) -> Vec<TaskRecord> {
        tasks.retain(|task| self.matches(task, today));
        tasks.sort_by(|a, b| b.task_id.cmp(&a.task_id));
        tasks
    }

    /// How many dropdown dimensions deviate from "all". Search is a text
    /// box, not a dropdown, so it does not count.
    pub fn active_filter_count(&self) -> usize {
        [
            &self.status,
            &self.priority,
            &self.task_type,
            &self.deadline_filter,
            &self.assignee,
        ]
        .into_iter()
        .filter(|&value| !is_unset(value))
        .count()
    }
}

/// Worker-list filter: free-text search over first/last/username plus an
/// exact position match.
#[derive(Debug, Clone, Default)]
pub struct WorkerFilter {
    pub search: Option<String>,
    pub position: Option<String>,
}

impl WorkerFilter {
    pub fn matches(&self, worker: &Worker) -> bool {
        if let Some(search) = &self.search {
            if !search.is_empty() {
                let needle = search.to_lowercase();
                let hit = worker.first_name.to_lowercase().contains(&needle)
                    || worker.last_name.to_lowercase().contains(&needle)
                    || worker.username.to_lowercase().contains(&needle);
                if !hit {
                    return false;
                }
            }
        }

        if !is_unset(&self.position) {
            match self.position.as_deref().and_then(|v| v.parse::<i32>().ok()) {
                Some(position_id) if worker.position_id == Some(position_id) => {}
                _ => return false,
            }
        }

        true
    }

    pub fn apply(&self, mut workers: Vec<Worker>) -> Vec<Worker> {
        workers.retain(|worker| self.matches(worker));
        workers
    }
}

/// One page of an already-filtered list. Pages are 1-based; a page past
/// the end is empty rather than an error.
pub fn paginate<T>(items: &[T], page: usize, per_page: usize) -> (&[T], usize) {
    let total_pages = items.len().div_ceil(per_page).max(1);
    let page = page.max(1);
    let start = (page - 1).saturating_mul(per_page);
    if start >= items.len() {
        return (&[], total_pages);
    }
    let end = (start + per_page).min(items.len());
    (&items[start..end], total_pages)
}

/// A `<select>` option: the value the client sends back, and the label
/// shown to the user. Built from live rows at request time.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FilterOption {
    pub value: String,
    pub label: String,
}

pub fn with_all(mut options: Vec<FilterOption>) -> Vec<FilterOption> {
    options.insert(
        0,
        FilterOption {
            value: ALL.to_string(),
            label: "All".to_string(),
        },
    );
    options
}

pub fn task_type_options(types: &[TaskType]) -> Vec<FilterOption> {
    let mut sorted: Vec<&TaskType> = types.iter().collect();
    sorted.sort_by(|a, b| a.name.cmp(&b.name));
    sorted
        .into_iter()
        .map(|t| FilterOption {
            value: t.task_type_id.to_string(),
            label: t.name.clone(),
        })
        .collect()
}

pub fn position_options(positions: &[Position]) -> Vec<FilterOption> {
    let mut sorted: Vec<&Position> = positions.iter().collect();
    sorted.sort_by(|a, b| a.name.cmp(&b.name));
    sorted
        .into_iter()
        .map(|p| FilterOption {
            value: p.position_id.to_string(),
            label: p.name.clone(),
        })
        .collect()
}

pub fn assignee_options(workers: &[Worker]) -> Vec<FilterOption> {
    let mut sorted: Vec<&Worker> = workers.iter().collect();
    sorted.sort_by(|a, b| a.username.cmp(&b.username));
    sorted
        .into_iter()
        .map(|w| FilterOption {
            value: w.worker_id.to_string(),
            label: w.display_name(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn today() -> NaiveDate {
        date(2024, 6, 15)
    }

    fn task(id: i32) -> TaskRecord {
        TaskRecord {
            task_id: id,
            name: format!("Task {}", id),
            description: String::new(),
            deadline: today(),
            is_completed: false,
            priority: Priority::Medium,
            task_type_id: None,
            task_type_name: None,
            assignee_ids: Vec::new(),
        }
    }

    fn filter(params: &[(&str, &str)]) -> TaskFilter {
        let mut f = TaskFilter::default();
        for (key, value) in params {
            let value = Some(value.to_string());
            match *key {
                "search" => f.search = value,
                "status" => f.status = value,
                "priority" => f.priority = value,
                "task_type" => f.task_type = value,
                "deadline_filter" => f.deadline_filter = value,
                "assignee" => f.assignee = value,
                other => panic!("unknown param {}", other),
            }
        }
        f
    }

    #[test]
    fn empty_filter_keeps_everything_ordered_by_descending_id() {
        let tasks = vec![task(1), task(3), task(2)];
        let result = TaskFilter::default().apply(tasks, today());
        let ids: Vec<i32> = result.iter().map(|t| t.task_id).collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }

    #[test]
    fn search_matches_name_or_description_case_insensitive() {
        let mut a = task(1);
        a.name = "Deploy API".into();
        let mut b = task(2);
        b.description = "needs api review".into();
        let mut c = task(3);
        c.name = "Unrelated".into();

        let f = filter(&[("search", "API")]);
        assert!(f.matches(&a, today()));
        assert!(f.matches(&b, today()));
        assert!(!f.matches(&c, today()));
    }

    #[test]
    fn status_completed_and_pending() {
        let mut done = task(1);
        done.is_completed = true;
        let open = task(2);

        let completed = filter(&[("status", "completed")]);
        assert!(completed.matches(&done, today()));
        assert!(!completed.matches(&open, today()));

        let pending = filter(&[("status", "pending")]);
        assert!(!pending.matches(&done, today()));
        assert!(pending.matches(&open, today()));

        // unrecognized status constrains nothing
        let bogus = filter(&[("status", "archived")]);
        assert!(bogus.matches(&done, today()));
        assert!(bogus.matches(&open, today()));
    }

    #[test]
    fn priority_is_exact_and_all_is_unconstrained() {
        let mut urgent = task(1);
        urgent.priority = Priority::Urgent;
        let medium = task(2);

        let f = filter(&[("priority", "urgent")]);
        assert!(f.matches(&urgent, today()));
        assert!(!f.matches(&medium, today()));

        let all = filter(&[("priority", "all")]);
        assert!(all.matches(&urgent, today()));
        assert!(all.matches(&medium, today()));

        // unknown priority value matches no task
        let junk = filter(&[("priority", "critical")]);
        assert!(!junk.matches(&urgent, today()));
    }

    #[test]
    fn task_type_exact_match_on_id() {
        let mut bug = task(1);
        bug.task_type_id = Some(7);
        let untyped = task(2);

        let f = filter(&[("task_type", "7")]);
        assert!(f.matches(&bug, today()));
        assert!(!f.matches(&untyped, today()));
        assert!(!filter(&[("task_type", "8")]).matches(&bug, today()));
    }

    #[test]
    fn deadline_windows() {
        let f_today = filter(&[("deadline_filter", "today")]);
        let f_3days = filter(&[("deadline_filter", "next_3_days")]);
        let f_week = filter(&[("deadline_filter", "next_week")]);

        let mut t = task(1);

        t.deadline = today();
        assert!(f_today.matches(&t, today()));
        assert!(f_3days.matches(&t, today()));
        assert!(f_week.matches(&t, today()));

        t.deadline = today() + Duration::days(3);
        assert!(!f_today.matches(&t, today()));
        assert!(f_3days.matches(&t, today()));
        assert!(f_week.matches(&t, today()));

        t.deadline = today() + Duration::days(7);
        assert!(!f_3days.matches(&t, today()));
        assert!(f_week.matches(&t, today()));

        t.deadline = today() + Duration::days(8);
        assert!(!f_week.matches(&t, today()));

        t.deadline = today() - Duration::days(1);
        assert!(!f_3days.matches(&t, today()));
        assert!(!f_week.matches(&t, today()));
    }

    #[test]
    fn overdue_requires_past_deadline_and_not_completed() {
        // pending task due yesterday is overdue; completing it clears it
        let f = filter(&[("status", "pending"), ("deadline_filter", "overdue")]);

        let mut t = task(1);
        t.priority = Priority::Urgent;
        t.deadline = today() - Duration::days(1);
        assert!(f.matches(&t, today()));

        t.is_completed = true;
        assert!(!f.matches(&t, today()));

        t.is_completed = false;
        t.deadline = today();
        assert!(!f.matches(&t, today()));
    }

    #[test]
    fn assignee_all_vs_specific_id() {
        let mut mine = task(1);
        mine.assignee_ids = vec![4, 9];
        let theirs = task(2);

        let all = filter(&[("assignee", "all")]);
        assert_eq!(all.apply(vec![mine.clone(), theirs.clone()], today()).len(), 2);

        let specific = filter(&[("assignee", "9")]);
        let result = specific.apply(vec![mine.clone(), theirs], today());
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].task_id, 1);
    }

    #[test]
    fn dimensions_combine_conjunctively() {
        let mut t = task(1);
        t.priority = Priority::High;
        t.assignee_ids = vec![2];

        let f = filter(&[("priority", "high"), ("assignee", "2"), ("status", "pending")]);
        assert!(f.matches(&t, today()));

        // any single failing dimension excludes the task
        let f = filter(&[("priority", "high"), ("assignee", "3"), ("status", "pending")]);
        assert!(!f.matches(&t, today()));
    }

    #[test]
    fn applying_twice_yields_the_same_result() {
        let mut tasks = Vec::new();
        for id in 1..=10 {
            let mut t = task(id);
            t.priority = if id % 2 == 0 { Priority::High } else { Priority::Low };
            tasks.push(t);
        }
        let f = filter(&[("priority", "high")]);
        let once = f.apply(tasks.clone(), today());
        let twice = f.apply(once.clone(), today());
        let once_ids: Vec<i32> = once.iter().map(|t| t.task_id).collect();
        let twice_ids: Vec<i32> = twice.iter().map(|t| t.task_id).collect();
        assert_eq!(once_ids, twice_ids);
    }

    #[test]
    fn active_filter_count_ignores_search_and_all() {
        let f = filter(&[
            ("search", "api"),
            ("status", "pending"),
            ("priority", "all"),
            ("assignee", "3"),
        ]);
        assert_eq!(f.active_filter_count(), 2);
        assert_eq!(TaskFilter::default().active_filter_count(), 0);
    }

    #[test]
    fn worker_filter_search_and_position() {
        let worker = Worker {
            worker_id: 1,
            username: "jdoe".into(),
            first_name: "Jane".into(),
            last_name: "Doe".into(),
            email: "jane@example.com".into(),
            password_hash: String::new(),
            is_active: true,
            is_staff: false,
            is_superuser: false,
            position_id: Some(3),
        };

        let mut f = WorkerFilter {
            search: Some("doe".into()),
            position: None,
        };
        assert!(f.matches(&worker));

        f.search = Some("JD".into());
        assert!(f.matches(&worker));

        f.search = Some("smith".into());
        assert!(!f.matches(&worker));

        f.search = None;
        f.position = Some("3".into());
        assert!(f.matches(&worker));
        f.position = Some("4".into());
        assert!(!f.matches(&worker));
        f.position = Some("all".into());
        assert!(f.matches(&worker));
    }

    #[test]
    fn pagination_slices_and_reports_total_pages() {
        let items: Vec<i32> = (1..=45).collect();
        let (page1, total) = paginate(&items, 1, 20);
        assert_eq!(total, 3);
        assert_eq!(page1.len(), 20);
        assert_eq!(page1[0], 1);

        let (page3, _) = paginate(&items, 3, 20);
        assert_eq!(page3.len(), 5);

        let (page9, total) = paginate(&items, 9, 20);
        assert_eq!(total, 3);
        assert!(page9.is_empty());

        let (empty, total) = paginate::<i32>(&[], 1, 20);
        assert!(empty.is_empty());
        assert_eq!(total, 1);
    }

    #[test]
    fn option_builders_sort_and_label() {
        let types = vec![
            TaskType { task_type_id: 2, name: "Bugfix".into() },
            TaskType { task_type_id: 1, name: "Audit".into() },
        ];
        let options = with_all(task_type_options(&types));
        assert_eq!(options[0].value, "all");
        assert_eq!(options[1].label, "Audit");
        assert_eq!(options[2].label, "Bugfix");

        let workers = vec![
            Worker {
                worker_id: 5,
                username: "zed".into(),
                first_name: String::new(),
                last_name: String::new(),
                email: String::new(),
                password_hash: String::new(),
                is_active: true,
                is_staff: false,
                is_superuser: false,
                position_id: None,
            },
            Worker {
                worker_id: 6,
                username: "amy".into(),
                first_name: "Amy".into(),
                last_name: "Lee".into(),
                email: String::new(),
                password_hash: String::new(),
                is_active: true,
                is_staff: false,
                is_superuser: false,
                position_id: None,
            },
        ];
        let options = assignee_options(&workers);
        assert_eq!(options[0].label, "Amy Lee");
        assert_eq!(options[1].label, "zed");
    }
}
