use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(sqlx::FromRow, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Role {
    pub role_id: Uuid,
    pub name: String,
}

pub const ADMIN_ROLE: &str = "Admin";
