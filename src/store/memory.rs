use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::models::department::Department;
use crate::models::employee::Employee;
use crate::store::{resolve_department, Applied, Change, EntityStore, StoreError, StoreResult};

#[derive(Debug, Clone, Default)]
struct Tables {
    employees: BTreeMap<i64, Employee>,
    departments: BTreeMap<i64, Department>,
    next_employee_id: i64,
    next_department_id: i64,
}

impl Tables {
    fn check_department_ref(&self, employee: &Employee) -> StoreResult<()> {
        match employee.department_id {
            Some(department_id) if !self.departments.contains_key(&department_id) => {
                Err(StoreError::ConstraintViolation(format!(
                    "employee references missing department {}",
                    department_id
                )))
            }
            _ => Ok(()),
        }
    }

    /// Applies `changes[position]`, returning the id it generated, if any.
    fn apply_one(
        &mut self,
        changes: &[Change],
        generated: &[Option<i64>],
        position: usize,
        applied: &mut Applied,
    ) -> StoreResult<Option<i64>> {
        match &changes[position] {
            Change::InsertEmployee { employee, staged_department } => {
                let department_id = resolve_department(changes, generated, employee, *staged_department)?;
                let employee = Employee { department_id, ..employee.clone() };
                self.check_department_ref(&employee)?;
                self.next_employee_id += 1;
                let id = self.next_employee_id;
                self.employees.insert(id, stored_employee(&employee, id));
                applied.generated_ids.push(id);
                applied.affected += 1;
                return Ok(Some(id));
            }
            Change::UpdateEmployee(employee) => {
                if self.employees.contains_key(&employee.id) {
                    self.check_department_ref(employee)?;
                    self.employees
                        .insert(employee.id, stored_employee(employee, employee.id));
                    applied.affected += 1;
                }
            }
            Change::DeleteEmployee(id) => {
                if self.employees.remove(id).is_some() {
                    applied.affected += 1;
                }
            }
            Change::InsertDepartment(department) => {
                self.next_department_id += 1;
                let id = self.next_department_id;
                self.departments
                    .insert(id, stored_department(department, id));
                applied.generated_ids.push(id);
                applied.affected += 1;
                return Ok(Some(id));
            }
            Change::UpdateDepartment(department) => {
                if self.departments.contains_key(&department.id) {
                    self.departments
                        .insert(department.id, stored_department(department, department.id));
                    applied.affected += 1;
                }
            }
            Change::DeleteDepartment(id) => {
                if !self.departments.contains_key(id) {
                    return Ok(None);
                }
                if self.employees.values().any(|e| e.department_id == Some(*id)) {
                    return Err(StoreError::ConstraintViolation(format!(
                        "department {} is still referenced by employees",
                        id
                    )));
                }
                self.departments.remove(id);
                applied.affected += 1;
            }
        }
        Ok(None)
    }
}

/// Relations are never persisted; they are resolved on read.
fn stored_employee(employee: &Employee, id: i64) -> Employee {
    Employee {
        id,
        department: None,
        ..employee.clone()
    }
}

fn stored_department(department: &Department, id: i64) -> Department {
    Department {
        id,
        employees: None,
        ..department.clone()
    }
}

/// Process-local store with the same commit semantics as [`PgStore`](crate::store::PgStore).
///
/// A batch is applied to a copy of the tables and swapped in only when every
/// change succeeds.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn find_employee(&self, id: i64) -> StoreResult<Option<Employee>> {
        Ok(self.tables.read().await.employees.get(&id).cloned())
    }

    async fn list_employees(&self, name_filter: Option<&str>) -> StoreResult<Vec<Employee>> {
        let term = name_filter.unwrap_or_default();
        let tables = self.tables.read().await;
        Ok(tables
            .employees
            .values()
            .filter(|e| e.name_matches(term))
            .cloned()
            .collect())
    }

    async fn list_employees_with_departments(&self) -> StoreResult<Vec<Employee>> {
        let tables = self.tables.read().await;
        Ok(tables
            .employees
            .values()
            .map(|e| Employee {
                department: e
                    .department_id
                    .and_then(|id| tables.departments.get(&id).cloned()),
                ..e.clone()
            })
            .collect())
    }

    async fn find_department(&self, id: i64) -> StoreResult<Option<Department>> {
        Ok(self.tables.read().await.departments.get(&id).cloned())
    }

    async fn find_department_with_employees(&self, id: i64) -> StoreResult<Option<Department>> {
        let tables = self.tables.read().await;
        Ok(tables.departments.get(&id).map(|d| Department {
            employees: Some(
                tables
                    .employees
                    .values()
                    .filter(|e| e.department_id == Some(id))
                    .cloned()
                    .collect(),
            ),
            ..d.clone()
        }))
    }

    async fn list_departments(&self) -> StoreResult<Vec<Department>> {
        Ok(self.tables.read().await.departments.values().cloned().collect())
    }

    async fn apply(&self, changes: &[Change]) -> StoreResult<Applied> {
        let mut tables = self.tables.write().await;
        let mut working = tables.clone();
        let mut applied = Applied::default();
        let mut generated = Vec::with_capacity(changes.len());
        for position in 0..changes.len() {
            let id = working.apply_one(changes, &generated, position, &mut applied)?;
            generated.push(id);
        }
        *tables = working;
        Ok(applied)
    }
}
