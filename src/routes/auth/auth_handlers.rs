use actix_web::{web, HttpRequest, HttpResponse, Responder};
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, Utc};
use log::{error, info};
use sqlx::MySqlPool;
use uuid::Uuid;

use super::auth_models::{LoginRequest, LoginResponse, LogoutResponse, RegisterResponse};
use crate::forms::{RegisterForm, ValidationErrorBody};
use crate::models::session::Session;
use crate::models::worker::Worker;

const WORKER_COLUMNS: &str = "worker_id, username, first_name, last_name, email, \
     password_hash, is_active, is_staff, is_superuser, position_id";

/// Resolve the worker behind the request's `session_id` cookie. Expired
/// sessions are removed on sight. Errors come back as a ready-to-send
/// response so handlers can `?`-style early-return with `match`.
pub async fn current_worker(pool: &MySqlPool, req: &HttpRequest) -> Result<Worker, HttpResponse> {
    let session_id = match req.cookie("session_id") {
        Some(cookie) => cookie.value().to_string(),
        None => {
            info!("Session ID not found in cookies");
            return Err(HttpResponse::Unauthorized().json(LoginResponse {
                success: false,
                message: "Authentication required".to_string(),
            }));
        }
    };

    let session_result = sqlx::query_as::<_, Session>(
        "SELECT session_id, worker_id, expires_at, is_persistent FROM Sessions_ WHERE session_id = ?",
    )
    .bind(&session_id)
    .fetch_optional(pool)
    .await;

    let session = match session_result {
        Ok(Some(session)) => session,
        Ok(None) => {
            info!("Invalid session ID: {}", session_id);
            return Err(HttpResponse::Unauthorized().json(LoginResponse {
                success: false,
                message: "Invalid session".to_string(),
            }));
        }
        Err(e) => {
            error!("Failed to look up session {}: {}", session_id, e);
            return Err(HttpResponse::InternalServerError().finish());
        }
    };

    if session.expires_at < Utc::now() {
        let _ = sqlx::query("DELETE FROM Sessions_ WHERE session_id = ?")
            .bind(&session_id)
            .execute(pool)
            .await;
        info!("Session expired: {}", session_id);
        return Err(HttpResponse::Unauthorized().json(LoginResponse {
            success: false,
            message: "Session expired, login is needed".to_string(),
        }));
    }

    let worker_result = sqlx::query_as::<_, Worker>(&format!(
        "SELECT {} FROM Workers_ WHERE worker_id = ?",
        WORKER_COLUMNS
    ))
    .bind(session.worker_id)
    .fetch_one(pool)
    .await;

    match worker_result {
        Ok(worker) => Ok(worker),
        Err(e) => {
            error!("Failed to fetch worker {}: {}", session.worker_id, e);
            Err(HttpResponse::InternalServerError().finish())
        }
    }
}

// register a new worker
pub async fn register(
    pool: web::Data<MySqlPool>,
    form: web::Json<RegisterForm>,
) -> impl Responder {
    info!("Received request to register worker: {}", form.username);

    if let Err(errors) = form.validate() {
        return HttpResponse::BadRequest().json(ValidationErrorBody::new(errors));
    }

    // Duplicate usernames are a field error, not a constraint violation
    let count_result = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM Workers_ WHERE username = ?",
    )
    .bind(form.username.trim())
    .fetch_one(pool.get_ref())
    .await;

    match count_result {
        Ok(0) => {}
        Ok(_) => {
            info!("Username already taken: {}", form.username);
            return HttpResponse::BadRequest().json(ValidationErrorBody::new(vec![
                crate::forms::FieldError {
                    field: "username".to_string(),
                    message: "A worker with that username already exists".to_string(),
                },
            ]));
        }
        Err(e) => {
            error!("Failed to check username {}: {}", form.username, e);
            return HttpResponse::InternalServerError().json(RegisterResponse {
                success: false,
                message: "Failed to register worker".to_string(),
                worker_id: None,
            });
        }
    }

    let hashed_password = match hash(&form.password, DEFAULT_COST) {
        Ok(hp) => hp,
        Err(e) => {
            error!("Failed to hash password: {}", e);
            return HttpResponse::InternalServerError().json(RegisterResponse {
                success: false,
                message: "Failed to hash password".to_string(),
                worker_id: None,
            });
        }
    };

    let insert_result = sqlx::query(
        "INSERT INTO Workers_ (username, first_name, last_name, email, password_hash) \
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(form.username.trim())
    .bind(form.first_name.trim())
    .bind(form.last_name.trim())
    .bind(form.email.trim())
    .bind(&hashed_password)
    .execute(pool.get_ref())
    .await;

    match insert_result {
        Ok(done) => {
            info!("Worker {} registered successfully", form.username);
            HttpResponse::Ok().json(RegisterResponse {
                success: true,
                message: "Worker registered successfully".to_string(),
                worker_id: Some(done.last_insert_id() as i32),
            })
        }
        Err(e) => {
            error!("Failed to register worker {}: {}", form.username, e);
            HttpResponse::InternalServerError().json(RegisterResponse {
                success: false,
                message: "Failed to register worker".to_string(),
                worker_id: None,
            })
        }
    }
}

// login logic
pub async fn login(pool: web::Data<MySqlPool>, req: web::Json<LoginRequest>) -> impl Responder {
    let username = &req.username;
    info!("Received login request for worker: {}", username);

    let worker_result = sqlx::query_as::<_, Worker>(&format!(
        "SELECT {} FROM Workers_ WHERE username = ?",
        WORKER_COLUMNS
    ))
    .bind(username)
    .fetch_optional(pool.get_ref())
    .await;

    let worker = match worker_result {
        Ok(Some(worker)) => worker,
        Ok(None) => {
            info!("Invalid username: {}", username);
            return HttpResponse::Unauthorized().json(LoginResponse {
                success: false,
                message: "Invalid username".to_string(),
            });
        }
        Err(e) => {
            error!("Failed to fetch worker {}: {}", username, e);
            return HttpResponse::InternalServerError().json(LoginResponse {
                success: false,
                message: "Failed to check credentials".to_string(),
            });
        }
    };

    if !worker.is_active {
        info!("Inactive worker attempted login: {}", username);
        return HttpResponse::Unauthorized().json(LoginResponse {
            success: false,
            message: "Account is inactive".to_string(),
        });
    }

    let valid = match verify(&req.password, &worker.password_hash) {
        Ok(valid) => valid,
        Err(e) => {
            error!("Error when checking password for worker {}: {}", username, e);
            return HttpResponse::Unauthorized().json(LoginResponse {
                success: false,
                message: "Error when checking password".to_string(),
            });
        }
    };

    if !valid {
        info!("Invalid password for worker: {}", username);
        return HttpResponse::Unauthorized().json(LoginResponse {
            success: false,
            message: "Invalid password".to_string(),
        });
    }

    let new_session_id = Uuid::new_v4().to_string();
    let expires_at = if req.remember_me {
        Utc::now() + Duration::days(10)
    } else {
        Utc::now() + Duration::minutes(30)
    };

    // One session per worker; a fresh login replaces whatever was there
    let delete_result = sqlx::query("DELETE FROM Sessions_ WHERE worker_id = ?")
        .bind(worker.worker_id)
        .execute(pool.get_ref())
        .await;

    if let Err(e) = delete_result {
        error!("Failed to clear sessions for worker {}: {}", username, e);
        return HttpResponse::InternalServerError().json(LoginResponse {
            success: false,
            message: "Failed to create session".to_string(),
        });
    }

    let insert_result = sqlx::query(
        "INSERT INTO Sessions_ (session_id, worker_id, expires_at, is_persistent) \
         VALUES (?, ?, ?, ?)",
    )
    .bind(&new_session_id)
    .bind(worker.worker_id)
    .bind(expires_at)
    .bind(req.remember_me)
    .execute(pool.get_ref())
    .await;

    if let Err(e) = insert_result {
        error!("Failed to insert session for worker {}: {}", username, e);
        return HttpResponse::InternalServerError().json(LoginResponse {
            success: false,
            message: "Failed to create session".to_string(),
        });
    }

    info!("Worker {} logged in successfully", username);
    HttpResponse::Ok()
        .cookie(
            actix_web::cookie::Cookie::build("session_id", new_session_id)
                .http_only(true)
                .finish(),
        )
        .json(LoginResponse {
            success: true,
            message: "Login successful".to_string(),
        })
}

pub async fn logout(pool: web::Data<MySqlPool>, req: HttpRequest) -> impl Responder {
    let session_id = match req.cookie("session_id") {
        Some(cookie) => cookie.value().to_string(),
        None => {
            info!("Session ID does not exist in cookies for logout");
            return HttpResponse::BadRequest().json(LogoutResponse {
                success: false,
                message: "Session ID does not exist".to_string(),
            });
        }
    };

    let delete_result = sqlx::query("DELETE FROM Sessions_ WHERE session_id = ?")
        .bind(&session_id)
        .execute(pool.get_ref())
        .await;

    match delete_result {
        Ok(done) if done.rows_affected() > 0 => {
            info!("Logout successful for session ID: {}", session_id);
            HttpResponse::Ok().json(LogoutResponse {
                success: true,
                message: "Logout successful".to_string(),
            })
        }
        Ok(_) => {
            info!("Session not found for session ID: {}", session_id);
            HttpResponse::BadRequest().json(LogoutResponse {
                success: false,
                message: "Session not found".to_string(),
            })
        }
        Err(e) => {
            error!("Failed to delete session ID {}: {}", session_id, e);
            HttpResponse::InternalServerError().json(LogoutResponse {
                success: false,
                message: "Failed to logout".to_string(),
            })
        }
    }
}
