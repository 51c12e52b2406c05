use std::sync::Arc;

use crate::models::department::Department;
use crate::store::{AssignedId, Change, Session, StoreResult};

pub struct DepartmentRepository {
    session: Arc<Session>,
}

impl DepartmentRepository {
    pub fn new(session: Arc<Session>) -> Self {
        Self { session }
    }

    pub async fn get(&self, id: i64) -> StoreResult<Option<Department>> {
        self.session.store().find_department(id).await
    }

    /// Same as [`get`](Self::get) with the department's employees loaded.
    pub async fn get_with_employees(&self, id: i64) -> StoreResult<Option<Department>> {
        self.session.store().find_department_with_employees(id).await
    }

    /// In insertion order, departments added in this session but not yet
    /// saved last.
    pub async fn get_all(&self) -> StoreResult<Vec<Department>> {
        let mut departments = self.session.store().list_departments().await?;
        departments.extend(self.session.staged_departments());
        Ok(departments)
    }

    pub async fn add(&self, department: Department) -> AssignedId {
        self.session.stage_department_insert(department)
    }

    pub fn update(&self, department: Department) {
        self.session.stage(Change::UpdateDepartment(department));
    }

    pub fn delete(&self, department: &Department) {
        self.session.stage(Change::DeleteDepartment(department.id));
    }
}
