use actix_web::{web, HttpRequest, HttpResponse, Responder};
use chrono::Utc;
use log::error;
use sqlx::MySqlPool;

use super::dashboard_models::{DashboardResponse, ScopeStats};
use crate::models::task::TaskRecord;
use crate::routes::auth::auth_handlers::current_worker;
use crate::routes::tasks::task_handlers::{load_task_records, load_workers, worker_map};
use crate::routes::tasks::task_models::TaskItem;
use crate::stats::{
    priority_distribution, top_workers, type_distribution, upcoming_tasks, urgent_tasks,
    ChartData, TaskStats, WorkerLoad,
};

fn scope_stats(tasks: &[TaskRecord], today: chrono::NaiveDate) -> ScopeStats {
    let priorities = priority_distribution(tasks);
    let types = type_distribution(tasks);
    ScopeStats {
        stats: TaskStats::compute(tasks, today),
        priority_chart: ChartData::from_priorities(&priorities),
        type_chart: ChartData::from_types(&types),
    }
}

// Handler for GET /
pub async fn dashboard(pool: web::Data<MySqlPool>, req: HttpRequest) -> impl Responder {
    let current = match current_worker(pool.get_ref(), &req).await {
        Ok(worker) => worker,
        Err(denied) => return denied,
    };

    let records = match load_task_records(pool.get_ref()).await {
        Ok(records) => records,
        Err(e) => {
            error!("Failed to load tasks for dashboard: {}", e);
            return HttpResponse::InternalServerError().finish();
        }
    };

    let workers = match load_workers(pool.get_ref()).await {
        Ok(workers) => workers,
        Err(e) => {
            error!("Failed to load workers for dashboard: {}", e);
            return HttpResponse::InternalServerError().finish();
        }
    };

    let today = Utc::now().date_naive();

    let personal: Vec<TaskRecord> = records
        .iter()
        .filter(|r| r.is_assigned_to(current.worker_id))
        .cloned()
        .collect();

    let loads: Vec<WorkerLoad> = workers
        .iter()
        .map(|worker| WorkerLoad {
            worker_id: worker.worker_id,
            display_name: worker.display_name(),
            task_count: records
                .iter()
                .filter(|r| r.is_assigned_to(worker.worker_id))
                .count(),
        })
        .collect();

    let by_id = worker_map(workers);
    let upcoming: Vec<TaskItem> = upcoming_tasks(&personal, today)
        .iter()
        .map(|r| TaskItem::from_record(r, &by_id))
        .collect();
    let urgent: Vec<TaskItem> = urgent_tasks(&personal)
        .iter()
        .map(|r| TaskItem::from_record(r, &by_id))
        .collect();

    HttpResponse::Ok().json(DashboardResponse {
        personal: scope_stats(&personal, today),
        team: scope_stats(&records, today),
        upcoming_tasks: upcoming,
        urgent_tasks: urgent,
        top_workers: top_workers(loads),
    })
}
