use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

use crate::errors::AppError;
use crate::handlers::extract::AuthUser;
use crate::handlers::IMAGES_FOLDER;
use crate::models::employee::Employee;
use crate::repositories::UnitOfWork;
use crate::services::FileStore;
use crate::utils::validation::{validate_payload, validate_phone};

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EmployeePayload {
    #[validate(length(min = 2, max = 50))]
    name: String,
    #[validate(range(min = 18, max = 65))]
    age: Option<i32>,
    #[validate(length(max = 200))]
    address: Option<String>,
    #[validate(custom = "validate_phone")]
    phone: Option<String>,
    #[validate(range(min = 0.0))]
    salary: f64,
    #[validate(email)]
    email: String,
    #[serde(default = "default_active")]
    is_active: bool,
    #[validate(length(min = 1, max = 255))]
    image_name: Option<String>,
    department_id: Option<i64>,
}

fn default_active() -> bool {
    true
}

impl EmployeePayload {
    fn into_employee(self, id: i64, created_at: chrono::DateTime<Utc>) -> Employee {
        Employee {
            id,
            name: self.name,
            age: self.age,
            address: self.address,
            phone: self.phone,
            salary: self.salary,
            email: self.email,
            is_active: self.is_active,
            image_name: self.image_name,
            department_id: self.department_id,
            created_at,
            department: None,
        }
    }
}

#[derive(Deserialize)]
pub struct EmployeeQueryParams {
    search: Option<String>,
}

pub async fn get_employees(
    _user: AuthUser,
    uow: UnitOfWork,
    query: web::Query<EmployeeQueryParams>,
) -> Result<HttpResponse, AppError> {
    let employees = match query.search.as_deref().map(str::trim) {
        Some(term) if !term.is_empty() => uow.employees().get_all(Some(term)).await?,
        _ => uow.employees().get_all_with_departments().await?,
    };

    Ok(HttpResponse::Ok().json(employees))
}

pub async fn get_employee(
    _user: AuthUser,
    uow: UnitOfWork,
    id: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let employee = uow.employees().get(id.into_inner()).await?
        .ok_or_else(|| AppError::NotFound("Employee not found".to_string()))?;

    Ok(HttpResponse::Ok().json(employee))
}

pub async fn create_employee(
    _user: AuthUser,
    uow: UnitOfWork,
    payload: web::Json<EmployeePayload>,
) -> Result<HttpResponse, AppError> {
    validate_payload(&*payload)?;

    let employee = payload.into_inner().into_employee(0, Utc::now());
    let assigned = uow.employees().add(employee.clone()).await;
    uow.save_changes().await?;

    let id = assigned.get()
        .ok_or_else(|| AppError::InternalServerError("Employee id was not assigned".to_string()))?;
    Ok(HttpResponse::Created().json(Employee { id, ..employee }))
}

pub async fn update_employee(
    _user: AuthUser,
    uow: UnitOfWork,
    id: web::Path<i64>,
    payload: web::Json<EmployeePayload>,
) -> Result<HttpResponse, AppError> {
    validate_payload(&*payload)?;

    let id = id.into_inner();
    let existing = uow.employees().get(id).await?
        .ok_or_else(|| AppError::NotFound("Employee not found".to_string()))?;

    let employee = payload.into_inner().into_employee(id, existing.created_at);
    uow.employees().update(employee.clone());
    if uow.save_changes().await? == 0 {
        log::warn!("Update of employee {} affected no rows", id);
        return Err(AppError::NotFound("Employee not found".to_string()));
    }

    Ok(HttpResponse::Ok().json(employee))
}

pub async fn delete_employee(
    _user: AuthUser,
    uow: UnitOfWork,
    file_store: web::Data<dyn FileStore>,
    id: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let employee = uow.employees().get(id.into_inner()).await?
        .ok_or_else(|| AppError::NotFound("Employee not found".to_string()))?;

    uow.employees().delete(&employee);
    if uow.save_changes().await? == 0 {
        return Err(AppError::NotFound("Employee not found".to_string()));
    }

    if let Some(image_name) = &employee.image_name {
        // the record is already gone; a stale image is only logged
        if let Err(err) = file_store.delete(IMAGES_FOLDER, image_name).await {
            log::error!("Failed to delete image {} of employee {}: {}", image_name, employee.id, err);
        }
    }

    Ok(HttpResponse::Ok().json(json!({
        "message": "Employee deleted successfully",
    })))
}
