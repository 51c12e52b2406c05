//! Collaborators the handlers talk to besides the unit of work.

pub mod file_store;
pub mod identity;
pub mod mail;

pub use file_store::{FileStore, S3FileStore};
pub use identity::{IdentityService, NewUser, PgIdentityService};
pub use mail::{LogMailSender, MailSender};
