use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

use crate::errors::AppError;
use crate::handlers::extract::AuthUser;
use crate::models::department::Department;
use crate::repositories::UnitOfWork;
use crate::utils::validation::validate_payload;

#[derive(Deserialize, Validate)]
pub struct DepartmentPayload {
    #[validate(length(min = 2, max = 50))]
    name: String,
    #[validate(length(min = 1, max = 20))]
    code: String,
}

pub async fn get_departments(
    _user: AuthUser,
    uow: UnitOfWork,
) -> Result<HttpResponse, AppError> {
    let departments = uow.departments().get_all().await?;
    Ok(HttpResponse::Ok().json(departments))
}

/// Includes the department's employees.
pub async fn get_department(
    _user: AuthUser,
    uow: UnitOfWork,
    id: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let department = uow.departments().get_with_employees(id.into_inner()).await?
        .ok_or_else(|| AppError::NotFound("Department not found".to_string()))?;

    Ok(HttpResponse::Ok().json(department))
}

pub async fn create_department(
    _user: AuthUser,
    uow: UnitOfWork,
    payload: web::Json<DepartmentPayload>,
) -> Result<HttpResponse, AppError> {
    validate_payload(&*payload)?;

    let payload = payload.into_inner();
    let department = Department::new(payload.name, payload.code);
    let assigned = uow.departments().add(department.clone()).await;
    uow.save_changes().await?;

    let id = assigned.get()
        .ok_or_else(|| AppError::InternalServerError("Department id was not assigned".to_string()))?;
    Ok(HttpResponse::Created().json(Department { id, ..department }))
}

pub async fn update_department(
    _user: AuthUser,
    uow: UnitOfWork,
    id: web::Path<i64>,
    payload: web::Json<DepartmentPayload>,
) -> Result<HttpResponse, AppError> {
    validate_payload(&*payload)?;

    let existing = uow.departments().get(id.into_inner()).await?
        .ok_or_else(|| AppError::NotFound("Department not found".to_string()))?;

    let payload = payload.into_inner();
    let department = Department {
        name: payload.name,
        code: payload.code,
        ..existing
    };
    uow.departments().update(department.clone());
    if uow.save_changes().await? == 0 {
        return Err(AppError::NotFound("Department not found".to_string()));
    }

    Ok(HttpResponse::Ok().json(department))
}

/// Refused with 409 while employees still reference the department.
pub async fn delete_department(
    _user: AuthUser,
    uow: UnitOfWork,
    id: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let department = uow.departments().get(id.into_inner()).await?
        .ok_or_else(|| AppError::NotFound("Department not found".to_string()))?;

    uow.departments().delete(&department);
    if uow.save_changes().await? == 0 {
        return Err(AppError::NotFound("Department not found".to_string()));
    }

    Ok(HttpResponse::Ok().json(json!({
        "message": "Department deleted successfully",
    })))
}
