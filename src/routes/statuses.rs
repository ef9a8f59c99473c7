use crate::{error::AppError, models::StatusInput, services::StatusService};
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use uuid::Uuid;
use validator::Validate;

#[get("")]
pub async fn get_statuses(service: web::Data<StatusService>) -> Result<impl Responder, AppError> {
    Ok(HttpResponse::Ok().json(service.get_statuses().await?))
}

#[post("")]
pub async fn create_status(
    service: web::Data<StatusService>,
    input: web::Json<StatusInput>,
) -> Result<impl Responder, AppError> {
    input.validate()?;
    let status = service.create_status(input.into_inner()).await?;
    Ok(HttpResponse::Created().json(status))
}

#[get("/{id}")]
pub async fn get_status(service: web::Data<StatusService>, path: web::Path<Uuid>) -> Result<impl Responder, AppError> {
    Ok(HttpResponse::Ok().json(service.get_status(path.into_inner()).await?))
}

#[put("/{id}")]
pub async fn update_status(
    service: web::Data<StatusService>,
    path: web::Path<Uuid>,
    input: web::Json<StatusInput>,
) -> Result<impl Responder, AppError> {
    input.validate()?;
    let status = service.update_status(path.into_inner(), input.into_inner()).await?;
    Ok(HttpResponse::Ok().json(status))
}

/// ## Responses:
/// - `204 No Content`: deleted.
/// - `409 Conflict`: a task is still in this status.
#[delete("/{id}")]
pub async fn delete_status(service: web::Data<StatusService>, path: web::Path<Uuid>) -> Result<impl Responder, AppError> {
    service.delete_status(path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}
