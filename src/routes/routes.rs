use actix_web::web;

use super::auth::auth_handlers;
use super::dashboard::dashboard_handlers;
use super::tasks::task_handlers;
use super::workers::worker_handlers;

pub fn auth_configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .route("/register/", web::post().to(auth_handlers::register))
            .route("/login/", web::post().to(auth_handlers::login))
            .route("/logout/", web::post().to(auth_handlers::logout)),
    );
}

pub fn dashboard_configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(dashboard_handlers::dashboard));
}

pub fn task_configure(cfg: &mut web::ServiceConfig) {
    // "/create/" is registered before "/{task_id}/" so the literal
    // segment wins over the id pattern
    cfg.service(
        web::scope("/tasks")
            .route("/", web::get().to(task_handlers::task_list))
            .route("/create/", web::get().to(task_handlers::task_create_form))
            .route("/create/", web::post().to(task_handlers::task_create))
            .route("/{task_id}/", web::get().to(task_handlers::task_detail))
            .route(
                "/{task_id}/update/",
                web::get().to(task_handlers::task_update_form),
            )
            .route(
                "/{task_id}/update/",
                web::post().to(task_handlers::task_update),
            )
            .route(
                "/{task_id}/delete/",
                web::post().to(task_handlers::task_delete),
            ),
    );
}

pub fn worker_configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/workers")
            .route("/", web::get().to(worker_handlers::worker_list))
            .route("/{worker_id}/", web::get().to(worker_handlers::worker_detail))
            .route(
                "/{worker_id}/update/",
                web::get().to(worker_handlers::worker_update_form),
            )
            .route(
                "/{worker_id}/update/",
                web::post().to(worker_handlers::worker_update),
            ),
    );
}
