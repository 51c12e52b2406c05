use async_trait::async_trait;
use aws_config::{BehaviorVersion, ConfigLoader};
use aws_sdk_s3::Client as S3Client;
use aws_types::region::Region;
use uuid::Uuid;

use crate::errors::AppError;

/// Upper bound for a single uploaded file (2 MiB).
pub const MAX_FILE_SIZE: usize = 2 * 1024 * 1024;

#[async_trait]
pub trait FileStore: Send + Sync {
    /// Stores `bytes` under `folder` and returns the generated file name.
    async fn upload(&self, folder: &str, bytes: &[u8]) -> Result<String, AppError>;

    async fn delete(&self, folder: &str, file_name: &str) -> Result<(), AppError>;
}

/// Checks size and content type, returning the extension to store under.
pub fn sniff_image(bytes: &[u8]) -> Result<&'static str, AppError> {
    if bytes.len() > MAX_FILE_SIZE {
        return Err(AppError::BadRequest("File size exceeds 2MiB limit".to_string()));
    }
    let file_type = infer::get(bytes).ok_or_else(|| AppError::BadRequest("Invalid file type".to_string()))?;
    if !matches!(file_type.mime_type(), "image/jpeg" | "image/png") {
        return Err(AppError::BadRequest("Only JPEG and PNG files are allowed".to_string()));
    }
    Ok(file_type.extension())
}

fn object_key(folder: &str, file_name: &str) -> String {
    format!("{}/{}", folder.trim_matches('/'), file_name)
}

pub struct S3FileStore {
    client: S3Client,
    bucket: String,
}

impl S3FileStore {
    pub fn new(client: S3Client, bucket: impl Into<String>) -> Self {
        Self { client, bucket: bucket.into() }
    }

    pub async fn from_env(region: Option<String>, bucket: impl Into<String>) -> Self {
        let aws_config = ConfigLoader::default()
            .region(region.map(Region::new))
            .behavior_version(BehaviorVersion::latest())
            .load()
            .await;

        Self::new(S3Client::new(&aws_config), bucket)
    }
}

#[async_trait]
impl FileStore for S3FileStore {
    async fn upload(&self, folder: &str, bytes: &[u8]) -> Result<String, AppError> {
        let extension = sniff_image(bytes)?;
        let file_name = format!("{}.{}", Uuid::new_v4(), extension);

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(object_key(folder, &file_name))
            .body(bytes.to_vec().into())
            .send()
            .await
            .map_err(|err| {
                log::error!("S3 upload failed: {:?}", err);
                AppError::AWSError("Failed to upload file".to_string())
            })?;

        Ok(file_name)
    }

    async fn delete(&self, folder: &str, file_name: &str) -> Result<(), AppError> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(object_key(folder, file_name))
            .send()
            .await
            .map_err(|err| {
                log::error!("S3 delete failed: {:?}", err);
                AppError::AWSError("Failed to delete file".to_string())
            })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_HEADER: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

    #[test]
    fn accepts_png() {
        assert_eq!(sniff_image(PNG_HEADER).unwrap(), "png");
    }

    #[test]
    fn rejects_unknown_and_oversized() {
        assert!(sniff_image(b"plain text").is_err());
        let mut big = PNG_HEADER.to_vec();
        big.resize(MAX_FILE_SIZE + 1, 0);
        assert!(sniff_image(&big).is_err());
    }

    #[test]
    fn keys_are_folder_scoped() {
        assert_eq!(object_key("/Images/", "a.png"), "Images/a.png");
    }
}
