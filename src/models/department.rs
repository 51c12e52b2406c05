use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

use crate::models::employee::Employee;

#[derive(sqlx::FromRow, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Department {
    pub id: i64,
    pub name: String,
    pub code: String,
    pub created_at: DateTime<Utc>,
    /// Inverse side of `Employee::department_id`, only filled by
    /// `DepartmentRepository::get_with_employees`.
    #[sqlx(skip)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employees: Option<Vec<Employee>>,
}

impl Department {
    pub fn new(name: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            id: 0,
            name: name.into(),
            code: code.into(),
            created_at: Utc::now(),
            employees: None,
        }
    }
}
