use crate::{error::AppError, models::LabelInput, services::LabelService};
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use uuid::Uuid;
use validator::Validate;

#[get("")]
pub async fn get_labels(service: web::Data<LabelService>) -> Result<impl Responder, AppError> {
    let labels = service.get_labels().await?;
    Ok(HttpResponse::Ok().json(labels))
}

#[post("")]
pub async fn create_label(
    service: web::Data<LabelService>,
    label_data: web::Json<LabelInput>,
) -> Result<impl Responder, AppError> {
    label_data.validate()?;
    let label = service.create_label(label_data.into_inner()).await?;
    Ok(HttpResponse::Created().json(label))
}

#[get("/{id}")]
pub async fn get_label(service: web::Data<LabelService>, path: web::Path<Uuid>) -> Result<impl Responder, AppError> {
    let label = service.get_label(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(label))
}

#[put("/{id}")]
pub async fn update_label(
    service: web::Data<LabelService>,
    path: web::Path<Uuid>,
    label_data: web::Json<LabelInput>,
) -> Result<impl Responder, AppError> {
    label_data.validate()?;
    let label = service.update_label(path.into_inner(), label_data.into_inner()).await?;
    Ok(HttpResponse::Ok().json(label))
}

/// Fails with `409 Conflict` while a task still carries the label.
#[delete("/{id}")]
pub async fn delete_label(service: web::Data<LabelService>, path: web::Path<Uuid>) -> Result<impl Responder, AppError> {
    service.delete_label(path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}
