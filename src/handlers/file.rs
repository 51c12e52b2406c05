use actix_web::{web, HttpResponse};
use serde::Serialize;

use crate::errors::AppError;
use crate::handlers::extract::AuthUser;
use crate::services::FileStore;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FileUploadResponse {
    file_name: String,
}

/// Raw request body is the file; the stored name goes into `imageName` of an employee.
pub async fn upload_file(
    _user: AuthUser,
    file_store: web::Data<dyn FileStore>,
    folder: web::Path<String>,
    file: web::Bytes,
) -> Result<HttpResponse, AppError> {
    let folder = folder.into_inner();
    if folder.is_empty() || !folder.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
        return Err(AppError::BadRequest("Invalid folder name".to_string()));
    }

    let file_name = file_store.upload(&folder, &file).await?;
    Ok(HttpResponse::Created().json(FileUploadResponse { file_name }))
}
