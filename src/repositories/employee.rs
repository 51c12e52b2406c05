use std::sync::Arc;

use crate::models::employee::Employee;
use crate::store::{AssignedId, Change, Session, StoreResult};

/// Employee queries and staged writes over a shared session.
pub struct EmployeeRepository {
    session: Arc<Session>,
}

impl EmployeeRepository {
    pub fn new(session: Arc<Session>) -> Self {
        Self { session }
    }

    /// Does not resolve `department`.
    pub async fn get(&self, id: i64) -> StoreResult<Option<Employee>> {
        self.session.store().find_employee(id).await
    }

    /// Employees whose name contains `search`, ignoring case. `None` or an
    /// empty term lists everyone. Employees added in this session but not yet
    /// saved follow the committed ones, with id 0.
    pub async fn get_all(&self, search: Option<&str>) -> StoreResult<Vec<Employee>> {
        let search = search.filter(|term| !term.is_empty());
        let mut employees = self.session.store().list_employees(search).await?;
        employees.extend(
            self.session
                .staged_employees()
                .into_iter()
                .map(|(employee, _)| employee)
                .filter(|employee| employee.name_matches(search.unwrap_or_default())),
        );
        Ok(employees)
    }

    /// Unfiltered listing with each employee's department joined in,
    /// including employees added in this session but not yet saved.
    pub async fn get_all_with_departments(&self) -> StoreResult<Vec<Employee>> {
        let mut employees = self.session.store().list_employees_with_departments().await?;
        for (employee, staged_department) in self.session.staged_employees() {
            let department = match (staged_department, employee.department_id) {
                (Some(department), _) => Some(department),
                (None, Some(id)) => self.session.store().find_department(id).await?,
                (None, None) => None,
            };
            employees.push(Employee { department, ..employee });
        }
        Ok(employees)
    }

    pub async fn add(&self, employee: Employee) -> AssignedId {
        self.session.stage_employee_insert(employee)
    }

    /// Adds `employee` to `department`, which may itself be a department added
    /// in this session and not yet saved. Both are then written by the same
    /// commit, the department first.
    pub async fn add_to_department(
        &self,
        employee: Employee,
        department: &AssignedId,
    ) -> StoreResult<AssignedId> {
        self.session.stage_employee_insert_in(employee, department)
    }

    /// Full replacement keyed by `employee.id`. An unknown id is not an
    /// error; it shows up as zero affected rows at commit.
    pub fn update(&self, employee: Employee) {
        self.session.stage(Change::UpdateEmployee(employee));
    }

    pub fn delete(&self, employee: &Employee) {
        self.session.stage(Change::DeleteEmployee(employee.id));
    }
}
