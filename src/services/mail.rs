use async_trait::async_trait;
use log::info;

use crate::errors::AppError;
use crate::models::email::Email;

#[async_trait]
pub trait MailSender: Send + Sync {
    async fn send(&self, email: Email) -> Result<(), AppError>;
}

/// Writes outgoing mail to the log instead of a mail server.
pub struct LogMailSender {
    from: String,
}

impl LogMailSender {
    pub fn new(from: impl Into<String>) -> Self {
        Self { from: from.into() }
    }
}

#[async_trait]
impl MailSender for LogMailSender {
    async fn send(&self, email: Email) -> Result<(), AppError> {
        info!(
            "Mail from {} to {}: {}\n{}",
            self.from, email.recipient, email.subject, email.body
        );
        Ok(())
    }
}
