use std::collections::HashMap;

use actix_web::{web, HttpRequest, HttpResponse, Responder};
use chrono::Utc;
use log::{error, info};
use sqlx::MySqlPool;

use super::task_models::{
    deadline_options, priority_options, status_options, TaskDetailResponse, TaskFilterState,
    TaskFormContext, TaskItem, TaskListQuery, TaskListResponse, TaskMutationResponse,
};
use crate::filters::{
    assignee_options, paginate, task_type_options, with_all, PAGE_SIZE,
};
use crate::forms::{FieldError, TaskForm, ValidationErrorBody};
use crate::models::task::{TaskRecord, TaskRow};
use crate::models::task_type::TaskType;
use crate::models::worker::Worker;
use crate::routes::auth::auth_handlers::current_worker;

const TASK_COLUMNS: &str =
    "task_id, name, description, deadline, is_completed, priority, task_type_id";

/// All tasks joined with type names and assignee links, one record per
/// task id.
pub async fn load_task_records(pool: &MySqlPool) -> Result<Vec<TaskRecord>, sqlx::Error> {
    let rows = sqlx::query_as::<_, TaskRow>(&format!("SELECT {} FROM Tasks_", TASK_COLUMNS))
        .fetch_all(pool)
        .await?;

    let types = sqlx::query_as::<_, TaskType>("SELECT task_type_id, name FROM TaskTypes_")
        .fetch_all(pool)
        .await?;
    let type_names: HashMap<i32, String> =
        types.into_iter().map(|t| (t.task_type_id, t.name)).collect();

    let links = sqlx::query_as::<_, (i32, i32)>(
        "SELECT task_id, worker_id FROM TaskAssignees_ ORDER BY task_id, worker_id",
    )
    .fetch_all(pool)
    .await?;
    let mut assignees: HashMap<i32, Vec<i32>> = HashMap::new();
    for (task_id, worker_id) in links {
        assignees.entry(task_id).or_default().push(worker_id);
    }

    Ok(rows
        .into_iter()
        .map(|row| TaskRecord::assemble(row, &type_names, &assignees))
        .collect())
}

pub async fn load_task_record(
    pool: &MySqlPool,
    task_id: i32,
) -> Result<Option<TaskRecord>, sqlx::Error> {
    let row = sqlx::query_as::<_, TaskRow>(&format!(
        "SELECT {} FROM Tasks_ WHERE task_id = ?",
        TASK_COLUMNS
    ))
    .bind(task_id)
    .fetch_optional(pool)
    .await?;

    let row = match row {
        Some(row) => row,
        None => return Ok(None),
    };

    let mut type_names = HashMap::new();
    if let Some(type_id) = row.task_type_id {
        let task_type = sqlx::query_as::<_, TaskType>(
            "SELECT task_type_id, name FROM TaskTypes_ WHERE task_type_id = ?",
        )
        .bind(type_id)
        .fetch_optional(pool)
        .await?;
        if let Some(task_type) = task_type {
            type_names.insert(task_type.task_type_id, task_type.name);
        }
    }

    let links = sqlx::query_as::<_, (i32, i32)>(
        "SELECT task_id, worker_id FROM TaskAssignees_ WHERE task_id = ? ORDER BY worker_id",
    )
    .bind(task_id)
    .fetch_all(pool)
    .await?;
    let mut assignees: HashMap<i32, Vec<i32>> = HashMap::new();
    for (task_id, worker_id) in links {
        assignees.entry(task_id).or_default().push(worker_id);
    }

    Ok(Some(TaskRecord::assemble(row, &type_names, &assignees)))
}

pub async fn load_workers(pool: &MySqlPool) -> Result<Vec<Worker>, sqlx::Error> {
    sqlx::query_as::<_, Worker>(
        "SELECT worker_id, username, first_name, last_name, email, password_hash, \
         is_active, is_staff, is_superuser, position_id FROM Workers_ ORDER BY worker_id",
    )
    .fetch_all(pool)
    .await
}

pub fn worker_map(workers: Vec<Worker>) -> HashMap<i32, Worker> {
    workers.into_iter().map(|w| (w.worker_id, w)).collect()
}

async fn load_task_types(pool: &MySqlPool) -> Result<Vec<TaskType>, sqlx::Error> {
    sqlx::query_as::<_, TaskType>("SELECT task_type_id, name FROM TaskTypes_")
        .fetch_all(pool)
        .await
}

// Handler for GET /tasks/
pub async fn task_list(
    pool: web::Data<MySqlPool>,
    query: web::Query<TaskListQuery>,
) -> impl Responder {
    let records = match load_task_records(pool.get_ref()).await {
        Ok(records) => records,
        Err(e) => {
            error!("Failed to load tasks: {}", e);
            return HttpResponse::InternalServerError().finish();
        }
    };

    let workers = match load_workers(pool.get_ref()).await {
        Ok(workers) => workers,
        Err(e) => {
            error!("Failed to load workers: {}", e);
            return HttpResponse::InternalServerError().finish();
        }
    };

    let types = match load_task_types(pool.get_ref()).await {
        Ok(types) => types,
        Err(e) => {
            error!("Failed to load task types: {}", e);
            return HttpResponse::InternalServerError().finish();
        }
    };

    let filter = query.filter();
    let today = Utc::now().date_naive();
    let filtered = filter.apply(records, today);

    let page = query.page.unwrap_or(1);
    let (page_items, total_pages) = paginate(&filtered, page, PAGE_SIZE);

    let by_id = worker_map(workers.clone());
    let tasks: Vec<TaskItem> = page_items
        .iter()
        .map(|record| TaskItem::from_record(record, &by_id))
        .collect();

    HttpResponse::Ok().json(TaskListResponse {
        tasks,
        page: page.max(1),
        per_page: PAGE_SIZE,
        total_count: filtered.len(),
        total_pages,
        active_filter_count: filter.active_filter_count(),
        filters: TaskFilterState::from_query(&query),
        status_options: status_options(),
        priority_options: with_all(priority_options()),
        deadline_options: deadline_options(),
        task_type_options: with_all(task_type_options(&types)),
        assignee_options: with_all(assignee_options(&workers)),
    })
}

// Handler for GET /tasks/create/ and GET /tasks/{id}/update/
async fn form_context(
    pool: &MySqlPool,
    task: Option<TaskItem>,
) -> Result<TaskFormContext, sqlx::Error> {
    let types = load_task_types(pool).await?;
    let workers = load_workers(pool).await?;
    Ok(TaskFormContext {
        priority_options: priority_options(),
        task_type_options: task_type_options(&types),
        assignee_options: assignee_options(&workers),
        task,
    })
}

pub async fn task_create_form(pool: web::Data<MySqlPool>) -> impl Responder {
    match form_context(pool.get_ref(), None).await {
        Ok(context) => HttpResponse::Ok().json(context),
        Err(e) => {
            error!("Failed to build task form context: {}", e);
            HttpResponse::InternalServerError().finish()
        }
    }
}

/// The referenced task type must exist; a dangling id is a form error,
/// not a foreign-key blowup.
async fn check_task_type(
    pool: &MySqlPool,
    task_type_id: Option<i32>,
) -> Result<Option<FieldError>, sqlx::Error> {
    let type_id = match task_type_id {
        Some(type_id) => type_id,
        None => return Ok(None),
    };
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM TaskTypes_ WHERE task_type_id = ?",
    )
    .bind(type_id)
    .fetch_one(pool)
    .await?;
    if count == 0 {
        return Ok(Some(FieldError {
            field: "task_type_id".to_string(),
            message: "Unknown task type".to_string(),
        }));
    }
    Ok(None)
}

async fn replace_assignees(pool: &MySqlPool, task_id: i32, assignee_ids: &[i32]) {
    let delete_result = sqlx::query("DELETE FROM TaskAssignees_ WHERE task_id = ?")
        .bind(task_id)
        .execute(pool)
        .await;
    if let Err(e) = delete_result {
        error!("Failed to clear assignees for task {}: {}", task_id, e);
        return;
    }

    for worker_id in assignee_ids {
        let insert_result = sqlx::query(
            "INSERT INTO TaskAssignees_ (task_id, worker_id) \
             SELECT ?, worker_id FROM Workers_ WHERE worker_id = ?",
        )
        .bind(task_id)
        .bind(worker_id)
        .execute(pool)
        .await;

        match insert_result {
            Ok(done) if done.rows_affected() == 0 => {
                info!("Assignee not found, skipping: {}", worker_id);
            }
            Ok(_) => {}
            Err(e) => {
                error!("Failed to link worker {} to task {}: {}", worker_id, task_id, e);
            }
        }
    }
}

// Handler for POST /tasks/create/
pub async fn task_create(
    pool: web::Data<MySqlPool>,
    req: HttpRequest,
    form: web::Json<TaskForm>,
) -> impl Responder {
    if let Err(denied) = current_worker(pool.get_ref(), &req).await {
        return denied;
    }

    let validated = match form.validate() {
        Ok(validated) => validated,
        Err(errors) => return HttpResponse::BadRequest().json(ValidationErrorBody::new(errors)),
    };

    match check_task_type(pool.get_ref(), validated.task_type_id).await {
        Ok(None) => {}
        Ok(Some(field_error)) => {
            return HttpResponse::BadRequest().json(ValidationErrorBody::new(vec![field_error]));
        }
        Err(e) => {
            error!("Failed to check task type: {}", e);
            return HttpResponse::InternalServerError().finish();
        }
    }

    let insert_result = sqlx::query(
        "INSERT INTO Tasks_ (name, description, deadline, is_completed, priority, task_type_id) \
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&validated.name)
    .bind(&validated.description)
    .bind(validated.deadline)
    .bind(validated.is_completed)
    .bind(validated.priority)
    .bind(validated.task_type_id)
    .execute(pool.get_ref())
    .await;

    let task_id = match insert_result {
        Ok(done) => done.last_insert_id() as i32,
        Err(e) => {
            error!("Failed to add task {}: {}", validated.name, e);
            return HttpResponse::InternalServerError().json(TaskMutationResponse {
                success: false,
                message: "Failed to add task".to_string(),
                task_id: None,
            });
        }
    };

    replace_assignees(pool.get_ref(), task_id, &validated.assignee_ids).await;

    info!("Task {} created with id {}", validated.name, task_id);
    HttpResponse::Ok().json(TaskMutationResponse {
        success: true,
        message: "Task created successfully".to_string(),
        task_id: Some(task_id),
    })
}

// Handler for GET /tasks/{id}/
pub async fn task_detail(pool: web::Data<MySqlPool>, path: web::Path<i32>) -> impl Responder {
    let task_id = path.into_inner();

    let record = match load_task_record(pool.get_ref(), task_id).await {
        Ok(Some(record)) => record,
        Ok(None) => {
            info!("Task not found: {}", task_id);
            return HttpResponse::NotFound().json(TaskMutationResponse {
                success: false,
                message: "Task not found".to_string(),
                task_id: None,
            });
        }
        Err(e) => {
            error!("Failed to fetch task {}: {}", task_id, e);
            return HttpResponse::InternalServerError().finish();
        }
    };

    let workers = match load_workers(pool.get_ref()).await {
        Ok(workers) => worker_map(workers),
        Err(e) => {
            error!("Failed to load workers: {}", e);
            return HttpResponse::InternalServerError().finish();
        }
    };

    HttpResponse::Ok().json(TaskDetailResponse {
        task: TaskItem::from_record(&record, &workers),
    })
}

// Handler for GET /tasks/{id}/update/
pub async fn task_update_form(pool: web::Data<MySqlPool>, path: web::Path<i32>) -> impl Responder {
    let task_id = path.into_inner();

    let record = match load_task_record(pool.get_ref(), task_id).await {
        Ok(Some(record)) => record,
        Ok(None) => {
            info!("Task not found: {}", task_id);
            return HttpResponse::NotFound().json(TaskMutationResponse {
                success: false,
                message: "Task not found".to_string(),
                task_id: None,
            });
        }
        Err(e) => {
            error!("Failed to fetch task {}: {}", task_id, e);
            return HttpResponse::InternalServerError().finish();
        }
    };

    let workers = match load_workers(pool.get_ref()).await {
        Ok(workers) => worker_map(workers),
        Err(e) => {
            error!("Failed to load workers: {}", e);
            return HttpResponse::InternalServerError().finish();
        }
    };
    let task = TaskItem::from_record(&record, &workers);

    match form_context(pool.get_ref(), Some(task)).await {
        Ok(context) => HttpResponse::Ok().json(context),
        Err(e) => {
            error!("Failed to build task form context: {}", e);
            HttpResponse::InternalServerError().finish()
        }
    }
}

// Handler for POST /tasks/{id}/update/
pub async fn task_update(
    pool: web::Data<MySqlPool>,
    req: HttpRequest,
    path: web::Path<i32>,
    form: web::Json<TaskForm>,
) -> impl Responder {
    if let Err(denied) = current_worker(pool.get_ref(), &req).await {
        return denied;
    }
    let task_id = path.into_inner();

    let exists = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM Tasks_ WHERE task_id = ?")
        .bind(task_id)
        .fetch_one(pool.get_ref())
        .await;
    match exists {
        Ok(0) => {
            info!("Task not found: {}", task_id);
            return HttpResponse::NotFound().json(TaskMutationResponse {
                success: false,
                message: "Task not found".to_string(),
                task_id: None,
            });
        }
        Ok(_) => {}
        Err(e) => {
            error!("Failed to check task {}: {}", task_id, e);
            return HttpResponse::InternalServerError().finish();
        }
    }

    let validated = match form.validate() {
        Ok(validated) => validated,
        Err(errors) => return HttpResponse::BadRequest().json(ValidationErrorBody::new(errors)),
    };

    match check_task_type(pool.get_ref(), validated.task_type_id).await {
        Ok(None) => {}
        Ok(Some(field_error)) => {
            return HttpResponse::BadRequest().json(ValidationErrorBody::new(vec![field_error]));
        }
        Err(e) => {
            error!("Failed to check task type: {}", e);
            return HttpResponse::InternalServerError().finish();
        }
    }

    let update_result = sqlx::query(
        "UPDATE Tasks_ SET name = ?, description = ?, deadline = ?, is_completed = ?, \
         priority = ?, task_type_id = ? WHERE task_id = ?",
    )
    .bind(&validated.name)
    .bind(&validated.description)
    .bind(validated.deadline)
    .bind(validated.is_completed)
    .bind(validated.priority)
    .bind(validated.task_type_id)
    .bind(task_id)
    .execute(pool.get_ref())
    .await;

    if let Err(e) = update_result {
        error!("Failed to update task {}: {}", task_id, e);
        return HttpResponse::InternalServerError().json(TaskMutationResponse {
            success: false,
            message: "Failed to update task".to_string(),
            task_id: None,
        });
    }

    replace_assignees(pool.get_ref(), task_id, &validated.assignee_ids).await;

    info!("Task {} updated", task_id);
    HttpResponse::Ok().json(TaskMutationResponse {
        success: true,
        message: "Task updated successfully".to_string(),
        task_id: Some(task_id),
    })
}

// Handler for POST /tasks/{id}/delete/
pub async fn task_delete(
    pool: web::Data<MySqlPool>,
    req: HttpRequest,
    path: web::Path<i32>,
) -> impl Responder {
    if let Err(denied) = current_worker(pool.get_ref(), &req).await {
        return denied;
    }
    let task_id = path.into_inner();

    // assignment links go first; the schema cascade is the backstop
    let link_result = sqlx::query("DELETE FROM TaskAssignees_ WHERE task_id = ?")
        .bind(task_id)
        .execute(pool.get_ref())
        .await;
    if let Err(e) = link_result {
        error!("Failed to clear assignees for task {}: {}", task_id, e);
        return HttpResponse::InternalServerError().finish();
    }

    let delete_result = sqlx::query("DELETE FROM Tasks_ WHERE task_id = ?")
        .bind(task_id)
        .execute(pool.get_ref())
        .await;

    match delete_result {
        Ok(done) if done.rows_affected() > 0 => {
            info!("Task {} deleted", task_id);
            HttpResponse::Ok().json(TaskMutationResponse {
                success: true,
                message: "Task deleted successfully".to_string(),
                task_id: Some(task_id),
            })
        }
        Ok(_) => {
            info!("Task not found: {}", task_id);
            HttpResponse::NotFound().json(TaskMutationResponse {
                success: false,
                message: "Task not found".to_string(),
                task_id: None,
            })
        }
        Err(e) => {
            error!("Failed to delete task {}: {}", task_id, e);
            HttpResponse::InternalServerError().json(TaskMutationResponse {
                success: false,
                message: "Failed to delete task".to_string(),
                task_id: None,
            })
        }
    }
}
