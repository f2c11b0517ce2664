use std::collections::HashMap;

use actix_web::{web, HttpRequest, HttpResponse, Responder};
use log::{error, info};
use sqlx::MySqlPool;

use super::worker_models::{
    WorkerDetailResponse, WorkerFormContext, WorkerItem, WorkerListQuery, WorkerListResponse,
    WorkerMutationResponse,
};
use crate::filters::{paginate, position_options, with_all, PAGE_SIZE};
use crate::forms::{may_edit_worker, FieldError, ValidationErrorBody, WorkerProfileForm};
use crate::models::position::Position;
use crate::models::worker::Worker;
use crate::routes::auth::auth_handlers::current_worker;
use crate::routes::tasks::task_handlers::{load_task_records, load_workers, worker_map};
use crate::routes::tasks::task_models::TaskItem;

async fn load_positions(pool: &MySqlPool) -> Result<Vec<Position>, sqlx::Error> {
    sqlx::query_as::<_, Position>("SELECT position_id, name FROM Positions_")
        .fetch_all(pool)
        .await
}

fn position_names(positions: &[Position]) -> HashMap<i32, String> {
    positions
        .iter()
        .map(|p| (p.position_id, p.name.clone()))
        .collect()
}

fn worker_item(worker: &Worker, names: &HashMap<i32, String>) -> WorkerItem {
    let position = worker.position_id.and_then(|id| names.get(&id).cloned());
    WorkerItem::from_worker(worker, position)
}

// Handler for GET /workers/
pub async fn worker_list(
    pool: web::Data<MySqlPool>,
    query: web::Query<WorkerListQuery>,
) -> impl Responder {
    let workers = match load_workers(pool.get_ref()).await {
        Ok(workers) => workers,
        Err(e) => {
            error!("Failed to load workers: {}", e);
            return HttpResponse::InternalServerError().finish();
        }
    };

    let positions = match load_positions(pool.get_ref()).await {
        Ok(positions) => positions,
        Err(e) => {
            error!("Failed to load positions: {}", e);
            return HttpResponse::InternalServerError().finish();
        }
    };

    let mut filtered = query.filter().apply(workers);
    filtered.sort_by(|a, b| {
        (&a.last_name, &a.first_name, &a.username).cmp(&(&b.last_name, &b.first_name, &b.username))
    });

    let page = query.page.unwrap_or(1);
    let (page_items, total_pages) = paginate(&filtered, page, PAGE_SIZE);

    let names = position_names(&positions);
    let items: Vec<WorkerItem> = page_items.iter().map(|w| worker_item(w, &names)).collect();

    HttpResponse::Ok().json(WorkerListResponse {
        workers: items,
        page: page.max(1),
        per_page: PAGE_SIZE,
        total_count: filtered.len(),
        total_pages,
        search: query.search.clone().unwrap_or_default(),
        position: WorkerListResponse::echo(&query.position),
        position_options: with_all(position_options(&positions)),
    })
}

async fn fetch_worker(pool: &MySqlPool, worker_id: i32) -> Result<Option<Worker>, sqlx::Error> {
    sqlx::query_as::<_, Worker>(
        "SELECT worker_id, username, first_name, last_name, email, password_hash, \
         is_active, is_staff, is_superuser, position_id FROM Workers_ WHERE worker_id = ?",
    )
    .bind(worker_id)
    .fetch_optional(pool)
    .await
}

// Handler for GET /workers/{id}/
pub async fn worker_detail(pool: web::Data<MySqlPool>, path: web::Path<i32>) -> impl Responder {
    let worker_id = path.into_inner();

    let worker = match fetch_worker(pool.get_ref(), worker_id).await {
        Ok(Some(worker)) => worker,
        Ok(None) => {
            info!("Worker not found: {}", worker_id);
            return HttpResponse::NotFound().json(WorkerMutationResponse {
                success: false,
                message: "Worker not found".to_string(),
            });
        }
        Err(e) => {
            error!("Failed to fetch worker {}: {}", worker_id, e);
            return HttpResponse::InternalServerError().finish();
        }
    };

    let positions = match load_positions(pool.get_ref()).await {
        Ok(positions) => positions,
        Err(e) => {
            error!("Failed to load positions: {}", e);
            return HttpResponse::InternalServerError().finish();
        }
    };

    let records = match load_task_records(pool.get_ref()).await {
        Ok(records) => records,
        Err(e) => {
            error!("Failed to load tasks for worker {}: {}", worker_id, e);
            return HttpResponse::InternalServerError().finish();
        }
    };

    let all_workers = match load_workers(pool.get_ref()).await {
        Ok(workers) => worker_map(workers),
        Err(e) => {
            error!("Failed to load workers: {}", e);
            return HttpResponse::InternalServerError().finish();
        }
    };

    let mut assigned: Vec<_> = records
        .iter()
        .filter(|r| r.is_assigned_to(worker_id))
        .collect();
    assigned.sort_by(|a, b| b.task_id.cmp(&a.task_id));

    let completed_tasks: Vec<TaskItem> = assigned
        .iter()
        .filter(|r| r.is_completed)
        .map(|r| TaskItem::from_record(r, &all_workers))
        .collect();
    let pending_tasks: Vec<TaskItem> = assigned
        .iter()
        .filter(|r| !r.is_completed)
        .map(|r| TaskItem::from_record(r, &all_workers))
        .collect();

    let names = position_names(&positions);
    HttpResponse::Ok().json(WorkerDetailResponse {
        worker: worker_item(&worker, &names),
        completed_count: completed_tasks.len(),
        pending_count: pending_tasks.len(),
        completed_tasks,
        pending_tasks,
    })
}

fn forbidden() -> HttpResponse {
    HttpResponse::Forbidden().json(WorkerMutationResponse {
        success: false,
        message: "You may only edit your own profile".to_string(),
    })
}

// Handler for GET /workers/{id}/update/
pub async fn worker_update_form(
    pool: web::Data<MySqlPool>,
    req: HttpRequest,
    path: web::Path<i32>,
) -> impl Responder {
    let current = match current_worker(pool.get_ref(), &req).await {
        Ok(worker) => worker,
        Err(denied) => return denied,
    };
    let worker_id = path.into_inner();

    if !may_edit_worker(current.worker_id, worker_id) {
        info!(
            "Worker {} denied profile edit of worker {}",
            current.worker_id, worker_id
        );
        return forbidden();
    }

    let positions = match load_positions(pool.get_ref()).await {
        Ok(positions) => positions,
        Err(e) => {
            error!("Failed to load positions: {}", e);
            return HttpResponse::InternalServerError().finish();
        }
    };

    let names = position_names(&positions);
    HttpResponse::Ok().json(WorkerFormContext {
        worker: worker_item(&current, &names),
        position_options: position_options(&positions),
    })
}

// Handler for POST /workers/{id}/update/
pub async fn worker_update(
    pool: web::Data<MySqlPool>,
    req: HttpRequest,
    path: web::Path<i32>,
    form: web::Json<WorkerProfileForm>,
) -> impl Responder {
    let current = match current_worker(pool.get_ref(), &req).await {
        Ok(worker) => worker,
        Err(denied) => return denied,
    };
    let worker_id = path.into_inner();

    // identity check comes before any validation or write
    if !may_edit_worker(current.worker_id, worker_id) {
        info!(
            "Worker {} denied profile edit of worker {}",
            current.worker_id, worker_id
        );
        return forbidden();
    }

    if let Err(errors) = form.validate() {
        return HttpResponse::BadRequest().json(ValidationErrorBody::new(errors));
    }

    let username = form.username.trim();
    let duplicate = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM Workers_ WHERE username = ? AND worker_id != ?",
    )
    .bind(username)
    .bind(worker_id)
    .fetch_one(pool.get_ref())
    .await;

    match duplicate {
        Ok(0) => {}
        Ok(_) => {
            info!("Username already taken: {}", username);
            return HttpResponse::BadRequest().json(ValidationErrorBody::new(vec![FieldError {
                field: "username".to_string(),
                message: "A worker with that username already exists".to_string(),
            }]));
        }
        Err(e) => {
            error!("Failed to check username {}: {}", username, e);
            return HttpResponse::InternalServerError().finish();
        }
    }

    if let Some(position_id) = form.position_id {
        let exists = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM Positions_ WHERE position_id = ?",
        )
        .bind(position_id)
        .fetch_one(pool.get_ref())
        .await;
        match exists {
            Ok(0) => {
                return HttpResponse::BadRequest().json(ValidationErrorBody::new(vec![
                    FieldError {
                        field: "position_id".to_string(),
                        message: "Unknown position".to_string(),
                    },
                ]));
            }
            Ok(_) => {}
            Err(e) => {
                error!("Failed to check position {}: {}", position_id, e);
                return HttpResponse::InternalServerError().finish();
            }
        }
    }

    let update_result = sqlx::query(
        "UPDATE Workers_ SET username = ?, first_name = ?, last_name = ?, email = ?, \
         position_id = ? WHERE worker_id = ?",
    )
    .bind(username)
    .bind(form.first_name.trim())
    .bind(form.last_name.trim())
    .bind(form.email.trim())
    .bind(form.position_id)
    .bind(worker_id)
    .execute(pool.get_ref())
    .await;

    match update_result {
        Ok(_) => {
            info!("Worker {} updated their profile", worker_id);
            HttpResponse::Ok().json(WorkerMutationResponse {
                success: true,
                message: "Profile updated successfully".to_string(),
            })
        }
        Err(e) => {
            error!("Failed to update worker {}: {}", worker_id, e);
            HttpResponse::InternalServerError().json(WorkerMutationResponse {
                success: false,
                message: "Failed to update profile".to_string(),
            })
        }
    }
}
