use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

use crate::models::department::Department;

#[derive(sqlx::FromRow, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Employee {
    pub id: i64,
    pub name: String,
    pub age: Option<i32>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub salary: f64,
    pub email: String,
    pub is_active: bool,
    pub image_name: Option<String>,
    pub department_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    /// Resolved only by the eager listing.
    #[sqlx(skip)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<Department>,
}

impl Employee {
    /// Unsaved employee; `id` stays 0 until the store assigns one on commit.
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: 0,
            name: name.into(),
            age: None,
            address: None,
            phone: None,
            salary: 0.0,
            email: email.into(),
            is_active: true,
            image_name: None,
            department_id: None,
            created_at: Utc::now(),
            department: None,
        }
    }

    pub fn in_department(mut self, department_id: i64) -> Self {
        self.department_id = Some(department_id);
        self
    }

    /// Case-insensitive substring match on the name. An empty term matches everything.
    pub fn name_matches(&self, term: &str) -> bool {
        term.is_empty() || self.name.to_lowercase().contains(&term.to_lowercase())
    }
}
