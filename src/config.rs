use std::env;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{0} cannot be empty")]
    Empty(&'static str),
}

/// Process configuration, read from the environment after `.env` is loaded.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_address: String,
    pub s3_bucket: String,
    pub aws_region: Option<String>,
    /// Used to build links in outgoing mail.
    pub public_base_url: String,
    pub mail_from: String,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Ok(Self {
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            bind_address: env::var("BIND_ADDRESS").unwrap_or_else(|_| "127.0.0.1:8080".into()),
            s3_bucket: required("AWS_S3_BUCKET")?,
            aws_region: env::var("AWS_REGION").ok(),
            public_base_url: env::var("PUBLIC_BASE_URL")
                .unwrap_or_else(|_| "http://127.0.0.1:8080".into()),
            mail_from: env::var("MAIL_FROM").unwrap_or_else(|_| "no-reply@localhost".into()),
        })
    }
}

fn required(key: &'static str) -> Result<String, ConfigError> {
    let value = env::var(key).map_err(|_| ConfigError::Missing(key))?;
    if value.trim().is_empty() {
        return Err(ConfigError::Empty(key));
    }
    Ok(value)
}
