use crate::{auth::AuthenticatedUser, error::AppError, models::UserInput, services::UserService};
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use uuid::Uuid;
use validator::Validate;

/// Register a new user
///
/// Public. Returns `201 Created` with the user (never the password hash),
/// `409 Conflict` when the email is taken.
#[post("")]
pub async fn create_user(
    service: web::Data<UserService>,
    register_data: web::Json<UserInput>,
) -> Result<impl Responder, AppError> {
    register_data.validate()?;
    let user = service.create_user(register_data.into_inner()).await?;
    Ok(HttpResponse::Created().json(user))
}

#[get("")]
pub async fn get_users(service: web::Data<UserService>) -> Result<impl Responder, AppError> {
    Ok(HttpResponse::Ok().json(service.get_users().await?))
}

#[get("/{id}")]
pub async fn get_user(service: web::Data<UserService>, path: web::Path<Uuid>) -> Result<impl Responder, AppError> {
    Ok(HttpResponse::Ok().json(service.get_user(path.into_inner()).await?))
}

/// Update own profile. Anyone else's id gives `403 Forbidden`.
#[put("/{id}")]
pub async fn update_user(
    service: web::Data<UserService>,
    path: web::Path<Uuid>,
    user_data: web::Json<UserInput>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    user_data.validate()?;
    let updated = service
        .update_user(path.into_inner(), user_data.into_inner(), &user)
        .await?;
    Ok(HttpResponse::Ok().json(updated))
}

#[delete("/{id}")]
pub async fn delete_user(
    service: web::Data<UserService>,
    path: web::Path<Uuid>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    service.delete_user(path.into_inner(), &user).await?;
    Ok(HttpResponse::NoContent().finish())
}
