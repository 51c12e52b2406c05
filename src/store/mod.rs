//! Persistence boundary.
//!
//! Reads go straight to committed state. Writes are collected by a
//! [`Session`] and handed to [`EntityStore::apply`] as one batch, which the
//! store applies completely or not at all. Within a batch an employee insert
//! may point at a department inserted earlier in the same batch.

pub mod memory;
pub mod postgres;
pub mod session;

use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use thiserror::Error;

use crate::models::department::Department;
use crate::models::employee::Employee;

pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use session::Session;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Foreign key, uniqueness, not-null or check constraint rejected the batch.
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),
    /// The engine detected a conflicting concurrent write.
    #[error("concurrency conflict: {0}")]
    ConcurrencyConflict(String),
    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// A single staged write.
#[derive(Debug, Clone)]
pub enum Change {
    InsertEmployee {
        employee: Employee,
        /// Position in the batch of the `InsertDepartment` whose generated id
        /// becomes the employee's `department_id`.
        staged_department: Option<usize>,
    },
    UpdateEmployee(Employee),
    DeleteEmployee(i64),
    InsertDepartment(Department),
    UpdateDepartment(Department),
    DeleteDepartment(i64),
}

/// Department id an employee insert is stored with. `generated` holds the id
/// produced by each change applied so far, `None` for updates and deletes.
pub(crate) fn resolve_department(
    changes: &[Change],
    generated: &[Option<i64>],
    employee: &Employee,
    staged_department: Option<usize>,
) -> StoreResult<Option<i64>> {
    let Some(position) = staged_department else {
        return Ok(employee.department_id);
    };
    match (changes.get(position), generated.get(position)) {
        (Some(Change::InsertDepartment(_)), Some(Some(id))) => Ok(Some(*id)),
        _ => Err(StoreError::ConstraintViolation(format!(
            "employee references department at batch position {} that is not inserted before it",
            position
        ))),
    }
}

/// Outcome of a committed batch.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Applied {
    /// Rows inserted, updated or deleted. Updates and deletes of unknown ids count 0.
    pub affected: u64,
    /// Ids generated for the batch's inserts, in staging order.
    pub generated_ids: Vec<i64>,
}

/// Slot for a store-generated id, filled once the staged insert commits.
#[derive(Debug, Clone, Default)]
pub struct AssignedId(Arc<OnceLock<i64>>);

impl AssignedId {
    pub fn get(&self) -> Option<i64> {
        self.0.get().copied()
    }

    pub(crate) fn assign(&self, id: i64) {
        let _ = self.0.set(id);
    }

    pub(crate) fn same_slot(&self, other: &AssignedId) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

#[async_trait]
pub trait EntityStore: Send + Sync {
    async fn find_employee(&self, id: i64) -> StoreResult<Option<Employee>>;

    /// Employees ordered by id, narrowed to a case-insensitive name match when
    /// `name_filter` is given.
    async fn list_employees(&self, name_filter: Option<&str>) -> StoreResult<Vec<Employee>>;

    /// Every employee with `department` resolved.
    async fn list_employees_with_departments(&self) -> StoreResult<Vec<Employee>>;

    async fn find_department(&self, id: i64) -> StoreResult<Option<Department>>;

    /// The department with `employees` materialized.
    async fn find_department_with_employees(&self, id: i64) -> StoreResult<Option<Department>>;

    /// Departments in insertion order.
    async fn list_departments(&self) -> StoreResult<Vec<Department>>;

    /// Applies the batch atomically.
    async fn apply(&self, changes: &[Change]) -> StoreResult<Applied>;
}
