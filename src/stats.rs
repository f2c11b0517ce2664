use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use serde::Serialize;

use crate::models::task::{Priority, TaskRecord};

/// count/total as a percentage rounded to 1 decimal. An empty scope is
/// 0.0, never a division error.
pub fn percent(count: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (count as f64 / total as f64 * 1000.0).round() / 10.0
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TaskStats {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
    pub overdue: usize,
    pub completion_percent: f64,
}

impl TaskStats {
    pub fn compute(tasks: &[TaskRecord], today: NaiveDate) -> TaskStats {
        let total = tasks.len();
        let completed = tasks.iter().filter(|t| t.is_completed).count();
        let overdue = tasks
            .iter()
            .filter(|t| !t.is_completed && t.deadline < today)
            .count();

        TaskStats {
            total,
            completed,
            pending: total - completed,
            overdue,
            completion_percent: percent(completed, total),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Slice {
    pub count: usize,
    pub percent: f64,
}

/// Per-priority share of the scope, most pressing first. Priorities with
/// no tasks are omitted.
pub fn priority_distribution(tasks: &[TaskRecord]) -> Vec<(Priority, Slice)> {
    let total = tasks.len();
    Priority::ALL
        .iter()
        .filter_map(|&priority| {
            let count = tasks.iter().filter(|t| t.priority == priority).count();
            if count == 0 {
                return None;
            }
            Some((
                priority,
                Slice {
                    count,
                    percent: percent(count, total),
                },
            ))
        })
        .collect()
}

/// Per-type share, computed only over tasks that have a type, keyed by
/// type name in name order.
pub fn type_distribution(tasks: &[TaskRecord]) -> BTreeMap<String, Slice> {
    let typed: Vec<&TaskRecord> = tasks
        .iter()
        .filter(|t| t.task_type_name.is_some())
        .collect();
    let total = typed.len();

    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for task in typed {
        if let Some(name) = &task.task_type_name {
            *counts.entry(name.clone()).or_default() += 1;
        }
    }

    counts
        .into_iter()
        .map(|(name, count)| {
            (
                name,
                Slice {
                    count,
                    percent: percent(count, total),
                },
            )
        })
        .collect()
}

/// Label/data pairs in parallel order, ready for a chart widget.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub data: Vec<usize>,
}

impl ChartData {
    pub fn from_priorities(distribution: &[(Priority, Slice)]) -> ChartData {
        ChartData {
            labels: distribution
                .iter()
                .map(|(p, _)| p.as_str().to_string())
                .collect(),
            data: distribution.iter().map(|(_, s)| s.count).collect(),
        }
    }

    pub fn from_types(distribution: &BTreeMap<String, Slice>) -> ChartData {
        ChartData {
            labels: distribution.keys().cloned().collect(),
            data: distribution.values().map(|s| s.count).collect(),
        }
    }
}

/// Personal pending tasks due within the next week (today inclusive,
/// today+7 exclusive), soonest deadline first, capped to 5.
pub fn upcoming_tasks(personal: &[TaskRecord], today: NaiveDate) -> Vec<TaskRecord> {
    let mut upcoming: Vec<TaskRecord> = personal
        .iter()
        .filter(|t| {
            !t.is_completed && t.deadline >= today && t.deadline < today + Duration::days(7)
        })
        .cloned()
        .collect();
    upcoming.sort_by_key(|t| t.deadline);
    upcoming.truncate(5);
    upcoming
}

/// Personal pending tasks at urgent or high priority, capped to 5 in
/// underlying order.
pub fn urgent_tasks(personal: &[TaskRecord]) -> Vec<TaskRecord> {
    let mut urgent: Vec<TaskRecord> = personal
        .iter()
        .filter(|t| {
            !t.is_completed && matches!(t.priority, Priority::Urgent | Priority::High)
        })
        .cloned()
        .collect();
    urgent.truncate(5);
    urgent
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct WorkerLoad {
    pub worker_id: i32,
    pub display_name: String,
    pub task_count: usize,
}

/// Top 5 workers by assigned task count. Ties keep the incoming order;
/// workers with nothing assigned are dropped.
pub fn top_workers(mut loads: Vec<WorkerLoad>) -> Vec<WorkerLoad> {
    loads.retain(|l| l.task_count > 0);
    loads.sort_by(|a, b| b.task_count.cmp(&a.task_count));
    loads.truncate(5);
    loads
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

    fn task(id: i32, priority: Priority, completed: bool, deadline: NaiveDate) -> TaskRecord {
        TaskRecord {
            task_id: id,
            name: format!("Task {}", id),
            description: String::new(),
            deadline,
            is_completed: completed,
            priority,
            task_type_id: None,
            task_type_name: None,
            assignee_ids: Vec::new(),
        }
    }

    #[test]
    fn percent_guards_zero_total_and_stays_in_bounds() {
        assert_eq!(percent(0, 0), 0.0);
        assert_eq!(percent(5, 0), 0.0);
        assert_eq!(percent(1, 3), 33.3);
        assert_eq!(percent(2, 3), 66.7);
        assert_eq!(percent(3, 3), 100.0);
        for count in 0..=17 {
            let p = percent(count, 17);
            assert!((0.0..=100.0).contains(&p));
        }
    }

    #[test]
    fn half_completed_scope_is_fifty_percent() {
        let tasks = vec![
            task(1, Priority::Medium, true, today()),
            task(2, Priority::Medium, true, today()),
            task(3, Priority::Medium, false, today()),
            task(4, Priority::Medium, false, today()),
        ];
        let stats = TaskStats::compute(&tasks, today());
        assert_eq!(stats.total, 4);
        assert_eq!(stats.completed, 2);
        assert_eq!(stats.pending, 2);
        assert_eq!(stats.completion_percent, 50.0);
    }

    #[test]
    fn empty_scope_yields_zeroes_and_empty_distributions() {
        let stats = TaskStats::compute(&[], today());
        assert_eq!(stats.total, 0);
        assert_eq!(stats.completion_percent, 0.0);
        assert!(priority_distribution(&[]).is_empty());
        assert!(type_distribution(&[]).is_empty());
    }

    #[test]
    fn overdue_counts_pending_past_deadline_only() {
        let tasks = vec![
            task(1, Priority::Low, false, today() - Duration::days(1)),
            task(2, Priority::Low, true, today() - Duration::days(1)),
            task(3, Priority::Low, false, today()),
        ];
        let stats = TaskStats::compute(&tasks, today());
        assert_eq!(stats.overdue, 1);
    }

    #[test]
    fn priority_distribution_omits_absent_and_orders_by_urgency() {
        let tasks = vec![
            task(1, Priority::Low, false, today()),
            task(2, Priority::Urgent, false, today()),
            task(3, Priority::Urgent, true, today()),
            task(4, Priority::Low, false, today()),
        ];
        let dist = priority_distribution(&tasks);
        assert_eq!(dist.len(), 2);
        assert_eq!(dist[0].0, Priority::Urgent);
        assert_eq!(dist[0].1, Slice { count: 2, percent: 50.0 });
        assert_eq!(dist[1].0, Priority::Low);

        let chart = ChartData::from_priorities(&dist);
        assert_eq!(chart.labels, vec!["urgent", "low"]);
        assert_eq!(chart.data, vec![2, 2]);
    }

    #[test]
    fn type_distribution_only_counts_typed_tasks() {
        let mut bug = task(1, Priority::Medium, false, today());
        bug.task_type_name = Some("Bugfix".into());
        let mut audit = task(2, Priority::Medium, false, today());
        audit.task_type_name = Some("Audit".into());
        let mut bug2 = task(3, Priority::Medium, false, today());
        bug2.task_type_name = Some("Bugfix".into());
        let untyped = task(4, Priority::Medium, false, today());

        let dist = type_distribution(&[bug, audit, bug2, untyped]);
        assert_eq!(dist.len(), 2);
        // percents are over the 3 typed tasks, not all 4
        assert_eq!(dist["Bugfix"], Slice { count: 2, percent: 66.7 });
        assert_eq!(dist["Audit"], Slice { count: 1, percent: 33.3 });

        let chart = ChartData::from_types(&dist);
        assert_eq!(chart.labels, vec!["Audit", "Bugfix"]);
        assert_eq!(chart.data, vec![1, 2]);
    }

    #[test]
    fn upcoming_is_windowed_sorted_and_capped() {
        let mut personal = vec![
            task(1, Priority::Medium, false, today() + Duration::days(6)),
            task(2, Priority::Medium, false, today() + Duration::days(7)), // outside
            task(3, Priority::Medium, false, today() - Duration::days(1)), // past
            task(4, Priority::Medium, true, today() + Duration::days(2)),  // completed
            task(5, Priority::Medium, false, today()),
        ];
        for id in 6..=12 {
            personal.push(task(id, Priority::Medium, false, today() + Duration::days(1)));
        }

        let upcoming = upcoming_tasks(&personal, today());
        assert_eq!(upcoming.len(), 5);
        assert_eq!(upcoming[0].task_id, 5);
        assert!(upcoming.windows(2).all(|w| w[0].deadline <= w[1].deadline));
    }

    #[test]
    fn urgent_keeps_pending_urgent_and_high_only() {
        let personal = vec![
            task(1, Priority::Urgent, false, today()),
            task(2, Priority::High, false, today()),
            task(3, Priority::High, true, today()),
            task(4, Priority::Medium, false, today()),
        ];
        let urgent = urgent_tasks(&personal);
        let ids: Vec<i32> = urgent.iter().map(|t| t.task_id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn top_workers_drops_idle_sorts_desc_and_caps_at_five() {
        let load = |id: i32, count: usize| WorkerLoad {
            worker_id: id,
            display_name: format!("w{}", id),
            task_count: count,
        };

        // only 3 of 6 workers carry tasks
        let result = top_workers(vec![
            load(1, 0),
            load(2, 4),
            load(3, 0),
            load(4, 9),
            load(5, 4),
            load(6, 0),
        ]);
        assert_eq!(result.len(), 3);
        assert_eq!(result[0].worker_id, 4);
        // tie between 2 and 5 keeps incoming order
        assert_eq!(result[1].worker_id, 2);
        assert_eq!(result[2].worker_id, 5);

        let result = top_workers((1..=8).map(|id| load(id, id as usize)).collect());
        assert_eq!(result.len(), 5);
        assert_eq!(result[0].task_count, 8);
    }
}
