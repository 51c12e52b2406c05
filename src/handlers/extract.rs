use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use futures_util::future::{ready, Ready};

use crate::errors::AppError;
use crate::models::role::ADMIN_ROLE;
use crate::repositories::UnitOfWork;
use crate::store::EntityStore;
use crate::utils::jwt::JwtKeys;

/// Caller identity taken from the bearer token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
    pub roles: Vec<String>,
}

impl AuthUser {
    pub fn require_role(&self, role: &str) -> Result<(), AppError> {
        if self.roles.iter().any(|r| r.eq_ignore_ascii_case(role)) {
            Ok(())
        } else {
            Err(AppError::Forbidden(format!("{} role required", role)))
        }
    }
}

fn authenticate(req: &HttpRequest) -> Result<AuthUser, AppError> {
    let keys = req.app_data::<web::Data<JwtKeys>>()
        .ok_or_else(|| AppError::InternalServerError("JWT keys not configured".to_string()))?;

    let token = req.headers().get("Authorization")
        .and_then(|auth| auth.to_str().ok())
        .and_then(|auth| auth.split_whitespace().nth(1))
        .ok_or_else(|| AppError::Unauthorized("Missing token".to_string()))?;

    let claims = keys.validate_token(token)
        .map_err(|err| AppError::Unauthorized(err.to_string()))?;

    Ok(AuthUser { user_id: claims.sub, roles: claims.roles })
}

impl FromRequest for AuthUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}

/// An authenticated caller holding the admin role.
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthUser);

impl FromRequest for AdminUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(authenticate(req).and_then(|user| {
            user.require_role(ADMIN_ROLE)?;
            Ok(AdminUser(user))
        }))
    }
}

/// A fresh unit of work per request, over the application's shared store.
/// It is dropped, and its scope closed, when the handler returns.
impl FromRequest for UnitOfWork {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let store = req.app_data::<web::Data<dyn EntityStore>>()
            .map(|store| UnitOfWork::new(store.clone().into_inner()))
            .ok_or_else(|| AppError::InternalServerError("Entity store not configured".to_string()));
        ready(store)
    }
}
