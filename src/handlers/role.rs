use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::errors::AppError;
use crate::handlers::extract::AdminUser;
use crate::models::role::Role;
use crate::models::user::UserInRole;
use crate::services::IdentityService;
use crate::utils::validation::validate_payload;

#[derive(Deserialize, Validate)]
pub struct RolePayload {
    #[validate(length(min = 2, max = 50))]
    name: String,
}

#[derive(Deserialize)]
pub struct RoleQueryParams {
    name: Option<String>,
}

async fn find_role(identity: &dyn IdentityService, role_id: Uuid) -> Result<Role, AppError> {
    identity.find_role(role_id).await?
        .ok_or_else(|| AppError::NotFound("Role not found".to_string()))
}

pub async fn get_roles(
    _admin: AdminUser,
    identity: web::Data<dyn IdentityService>,
    query: web::Query<RoleQueryParams>,
) -> Result<HttpResponse, AppError> {
    let roles = match query.name.as_deref().filter(|n| !n.is_empty()) {
        Some(name) => identity.find_role_by_name(name).await?.into_iter().collect(),
        None => identity.list_roles().await?,
    };
    Ok(HttpResponse::Ok().json(roles))
}

pub async fn get_role(
    _admin: AdminUser,
    identity: web::Data<dyn IdentityService>,
    role_id: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let role = find_role(identity.get_ref(), role_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(role))
}

pub async fn create_role(
    _admin: AdminUser,
    identity: web::Data<dyn IdentityService>,
    payload: web::Json<RolePayload>,
) -> Result<HttpResponse, AppError> {
    validate_payload(&*payload)?;

    let role = identity.create_role(&payload.name).await?;
    Ok(HttpResponse::Created().json(role))
}

pub async fn update_role(
    _admin: AdminUser,
    identity: web::Data<dyn IdentityService>,
    role_id: web::Path<Uuid>,
    payload: web::Json<RolePayload>,
) -> Result<HttpResponse, AppError> {
    validate_payload(&*payload)?;

    let role = identity.rename_role(role_id.into_inner(), &payload.name).await?
        .ok_or_else(|| AppError::NotFound("Role not found".to_string()))?;
    Ok(HttpResponse::Ok().json(role))
}

pub async fn delete_role(
    _admin: AdminUser,
    identity: web::Data<dyn IdentityService>,
    role_id: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    if !identity.delete_role(role_id.into_inner()).await? {
        return Err(AppError::NotFound("Role not found".to_string()));
    }
    Ok(HttpResponse::Ok().json(json!({
        "message": "Role deleted successfully",
    })))
}

/// Every user, flagged with whether they hold the role.
pub async fn get_role_users(
    _admin: AdminUser,
    identity: web::Data<dyn IdentityService>,
    role_id: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let role = find_role(identity.get_ref(), role_id.into_inner()).await?;
    let users = identity.users_in_role(role.role_id).await?;
    Ok(HttpResponse::Ok().json(users))
}

/// Brings membership in line with the submitted flags. Users not listed are
/// left alone. An unknown user rejects the request before anything changes.
pub async fn set_role_users(
    _admin: AdminUser,
    identity: web::Data<dyn IdentityService>,
    role_id: web::Path<Uuid>,
    users: web::Json<Vec<UserInRole>>,
) -> Result<HttpResponse, AppError> {
    let role = find_role(identity.get_ref(), role_id.into_inner()).await?;
    for entry in users.iter() {
        if identity.find_by_id(entry.user_id).await?.is_none() {
            return Err(AppError::NotFound(format!("User {} not found", entry.user_id)));
        }
    }

    for entry in users.iter() {
        let current = identity.is_in_role(entry.user_id, role.role_id).await?;
        if entry.is_in_role && !current {
            identity.add_to_role(entry.user_id, role.role_id).await?;
        } else if !entry.is_in_role && current {
            identity.remove_from_role(entry.user_id, role.role_id).await?;
        }
    }

    let users = identity.users_in_role(role.role_id).await?;
    Ok(HttpResponse::Ok().json(users))
}
