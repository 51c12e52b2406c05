use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use serde_json::json;
use url::Url;
use validator::Validate;

use crate::config::AppConfig;
use crate::errors::AppError;
use crate::models::email::Email;
use crate::services::{IdentityService, MailSender, NewUser};
use crate::utils::jwt::JwtKeys;
use crate::utils::validation::validate_payload;

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(email)]
    email: String,
    #[validate(length(min = 3, max = 50))]
    user_name: String,
    first_name: Option<String>,
    last_name: Option<String>,
    #[validate(length(min = 8, max = 64))]
    password: String,
    #[validate(must_match = "password")]
    confirm_password: String,
    is_agree: bool,
}

#[derive(Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    email: String,
    #[validate(length(min = 1))]
    password: String,
}

#[derive(Deserialize, Validate)]
pub struct ForgotPasswordRequest {
    #[validate(email)]
    email: String,
}

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    #[validate(email)]
    email: String,
    #[validate(length(min = 1))]
    token: String,
    #[validate(length(min = 8, max = 64))]
    password: String,
    #[validate(must_match = "password")]
    confirm_password: String,
}

#[derive(Serialize)]
pub struct AuthResponse {
    email: String,
    token: String,
}

pub async fn register(
    identity: web::Data<dyn IdentityService>,
    req: web::Json<RegisterRequest>,
) -> Result<HttpResponse, AppError> {
    validate_payload(&*req)?;
    if !req.is_agree {
        return Err(AppError::BadRequest("Terms must be accepted".to_string()));
    }

    let req = req.into_inner();
    let user = identity.register(NewUser {
        email: req.email,
        user_name: req.user_name,
        first_name: req.first_name,
        last_name: req.last_name,
        password: req.password,
    }).await?;

    log::info!("Registered user {}", user.user_id);
    Ok(HttpResponse::Created().json(user))
}

pub async fn login(
    identity: web::Data<dyn IdentityService>,
    keys: web::Data<JwtKeys>,
    req: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    validate_payload(&*req)?;

    let invalid = || AppError::Unauthorized("Incorrect email or password".to_string());
    let user = identity.find_by_email(&req.email).await?.ok_or_else(invalid)?;
    if !identity.check_password(&user, &req.password) {
        return Err(invalid());
    }

    let roles = identity.roles_for_user(user.user_id).await?;
    let token = keys.generate_token(&user.user_id.to_string(), roles)
        .map_err(|_| AppError::InternalServerError("Token generation error".to_string()))?;

    Ok(HttpResponse::Ok().json(AuthResponse { email: user.email, token }))
}

fn reset_link(base_url: &str, email: &str, token: &str) -> Result<String, AppError> {
    let mut url = Url::parse(base_url)
        .and_then(|base| base.join("/v1/account/reset-password"))
        .map_err(|err| AppError::InternalServerError(format!("Invalid PUBLIC_BASE_URL: {}", err)))?;
    url.query_pairs_mut()
        .append_pair("email", email)
        .append_pair("token", token);
    Ok(url.into())
}

pub async fn forgot_password(
    identity: web::Data<dyn IdentityService>,
    mail: web::Data<dyn MailSender>,
    config: web::Data<AppConfig>,
    req: web::Json<ForgotPasswordRequest>,
) -> Result<HttpResponse, AppError> {
    validate_payload(&*req)?;

    let user = identity.find_by_email(&req.email).await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let token = identity.generate_password_reset_token(&user)?;
    let email = Email {
        subject: "Reset Password".to_string(),
        body: reset_link(&config.public_base_url, &user.email, &token)?,
        recipient: user.email.clone(),
    };
    mail.send(email).await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Check your inbox",
    })))
}

pub async fn reset_password(
    identity: web::Data<dyn IdentityService>,
    req: web::Json<ResetPasswordRequest>,
) -> Result<HttpResponse, AppError> {
    validate_payload(&*req)?;

    let user = identity.find_by_email(&req.email).await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    identity.reset_password(&user, &req.token, &req.password).await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Password reset successfully",
    })))
}
