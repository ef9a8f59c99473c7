use crate::{
    auth::{AuthenticationManager, LoginRequest},
    error::AppError,
};
use actix_web::{post, web, HttpResponse, Responder};
use validator::Validate;

/// Login user
///
/// Authenticates a user and returns an authentication token.
#[post("/login")]
pub async fn login(
    manager: web::Data<AuthenticationManager>,
    login_data: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    login_data.validate()?;
    let response = manager.login(&login_data.email, &login_data.password).await?;
    Ok(HttpResponse::Ok().json(response))
}
