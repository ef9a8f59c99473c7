pub mod auth;
pub mod health;
pub mod labels;
pub mod statuses;
pub mod tasks;
pub mod users;

use actix_web::web;

use crate::error::AppError;

/// Unparseable JSON bodies become `400 Bad Request` instead of actix's plain-text default.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| AppError::BadRequest(err.to_string()).into())
}

pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| AppError::BadRequest(err.to_string()).into())
}

/// Registers every endpoint. Resources live under `api_path`; `/health` sits outside it.
pub fn config(cfg: &mut web::ServiceConfig, api_path: &str) {
    cfg.app_data(json_config())
        .app_data(query_config())
        .service(health::health)
        .service(
            web::scope(api_path)
                .service(auth::login)
                .service(
                    web::scope("/users")
                        .service(users::get_users)
                        .service(users::create_user)
                        .service(users::get_user)
                        .service(users::update_user)
                        .service(users::delete_user),
                )
                .service(
                    web::scope("/statuses")
                        .service(statuses::get_statuses)
                        .service(statuses::create_status)
                        .service(statuses::get_status)
                        .service(statuses::update_status)
                        .service(statuses::delete_status),
                )
                .service(
                    web::scope("/labels")
                        .service(labels::get_labels)
                        .service(labels::create_label)
                        .service(labels::get_label)
                        .service(labels::update_label)
                        .service(labels::delete_label),
                )
                .service(
                    web::scope("/tasks")
                        .service(tasks::get_tasks)
                        .service(tasks::create_task)
                        .service(tasks::get_task)
                        .service(tasks::update_task)
                        .service(tasks::delete_task),
                ),
        );
}
