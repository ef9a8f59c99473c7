use crate::{
    auth::AuthenticatedUser,
    error::AppError,
    models::{TaskInput, TaskQuery},
    services::TaskService,
};
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use uuid::Uuid;
use validator::Validate;

/// Lists tasks, newest first.
///
/// ## Query Parameters:
/// - `status_id` (optional): only tasks in this status.
/// - `executor_id` (optional): only tasks assigned to this user.
/// - `label_id` (optional): only tasks carrying this label.
/// - `my_tasks` (optional): when `true`, only tasks authored by the caller.
///
/// Without any parameter every task is returned.
#[get("")]
pub async fn get_tasks(
    service: web::Data<TaskService>,
    query_params: web::Query<TaskQuery>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let filter = query_params.into_inner().into_filter(user.id);
    let tasks = service.get_tasks_filtered(filter.as_ref()).await?;
    Ok(HttpResponse::Ok().json(tasks))
}

/// Creates a task authored by the caller.
///
/// ## Responses:
/// - `201 Created`: the new task with its references expanded.
/// - `400 Bad Request`: the status or one of the labels does not exist.
/// - `422 Unprocessable Entity`: the payload failed validation.
#[post("")]
pub async fn create_task(
    service: web::Data<TaskService>,
    task_data: web::Json<TaskInput>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    task_data.validate()?;
    let task = service.create_task(task_data.into_inner(), &user).await?;
    Ok(HttpResponse::Created().json(task))
}

#[get("/{id}")]
pub async fn get_task(service: web::Data<TaskService>, path: web::Path<Uuid>) -> Result<impl Responder, AppError> {
    let task = service.get_task_by_id(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(task))
}

/// Replaces name, description, status, executor and labels. The author never changes.
#[put("/{id}")]
pub async fn update_task(
    service: web::Data<TaskService>,
    path: web::Path<Uuid>,
    task_data: web::Json<TaskInput>,
) -> Result<impl Responder, AppError> {
    task_data.validate()?;
    let task = service.update_task(path.into_inner(), task_data.into_inner()).await?;
    Ok(HttpResponse::Ok().json(task))
}

#[delete("/{id}")]
pub async fn delete_task(service: web::Data<TaskService>, path: web::Path<Uuid>) -> Result<impl Responder, AppError> {
    service.delete_task(path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}
