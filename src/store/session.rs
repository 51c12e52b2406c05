use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{info, warn};

use crate::models::department::Department;
use crate::models::employee::Employee;
use crate::store::{AssignedId, Change, EntityStore, StoreError, StoreResult};

struct Staged {
    change: Change,
    assigned: Option<AssignedId>,
}

/// One staging queue over one store handle. Confined to a single request.
pub struct Session {
    store: Arc<dyn EntityStore>,
    staged: Mutex<Vec<Staged>>,
}

impl Session {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self {
            store,
            staged: Mutex::new(Vec::new()),
        }
    }

    pub fn store(&self) -> &dyn EntityStore {
        self.store.as_ref()
    }

    /// Queues an employee insert and returns the slot its generated id lands in.
    pub fn stage_employee_insert(&self, employee: Employee) -> AssignedId {
        push_insert(
            &mut self.queue(),
            Change::InsertEmployee {
                employee,
                staged_department: None,
            },
        )
    }

    /// Queues an employee insert that belongs to `department`, a department
    /// insert staged earlier in this session or one that already committed.
    pub fn stage_employee_insert_in(
        &self,
        mut employee: Employee,
        department: &AssignedId,
    ) -> StoreResult<AssignedId> {
        let mut queue = self.queue();
        let staged_department = match department.get() {
            Some(id) => {
                employee.department_id = Some(id);
                None
            }
            None => Some(
                queue
                    .iter()
                    .position(|s| {
                        matches!(s.change, Change::InsertDepartment(_))
                            && s.assigned.as_ref().is_some_and(|a| a.same_slot(department))
                    })
                    .ok_or_else(|| {
                        StoreError::ConstraintViolation(
                            "department is neither committed nor staged in this session".to_string(),
                        )
                    })?,
            ),
        };
        Ok(push_insert(
            &mut queue,
            Change::InsertEmployee {
                employee,
                staged_department,
            },
        ))
    }

    pub fn stage_department_insert(&self, department: Department) -> AssignedId {
        push_insert(&mut self.queue(), Change::InsertDepartment(department))
    }

    pub fn stage(&self, change: Change) {
        self.queue().push(Staged {
            change,
            assigned: None,
        });
    }

    pub fn pending(&self) -> usize {
        self.queue().len()
    }

    /// Employees staged for insert, in staging order, each paired with the
    /// staged department it was added to, if any. Their ids are still 0.
    pub fn staged_employees(&self) -> Vec<(Employee, Option<Department>)> {
        let queue = self.queue();
        queue
            .iter()
            .filter_map(|s| match &s.change {
                Change::InsertEmployee {
                    employee,
                    staged_department,
                } => {
                    let department = staged_department
                        .and_then(|position| queue.get(position))
                        .and_then(|s| match &s.change {
                            Change::InsertDepartment(department) => Some(department.clone()),
                            _ => None,
                        });
                    Some((employee.clone(), department))
                }
                _ => None,
            })
            .collect()
    }

    /// Departments staged for insert, in staging order. Their ids are still 0.
    pub fn staged_departments(&self) -> Vec<Department> {
        self.queue()
            .iter()
            .filter_map(|s| match &s.change {
                Change::InsertDepartment(department) => Some(department.clone()),
                _ => None,
            })
            .collect()
    }

    /// Drops every staged change, returning how many there were.
    pub fn discard(&self) -> usize {
        let mut queue = self.queue();
        let count = queue.len();
        queue.clear();
        count
    }

    /// Sends the staged batch to the store. The queue is emptied whether or
    /// not the store accepts the batch.
    pub async fn save_changes(&self) -> StoreResult<u64> {
        let staged = std::mem::take(&mut *self.queue());
        if staged.is_empty() {
            return Ok(0);
        }

        let changes: Vec<Change> = staged.iter().map(|s| s.change.clone()).collect();
        let applied = self.store.apply(&changes).await.map_err(|err| {
            warn!("Commit of {} staged change(s) rejected: {}", changes.len(), err);
            err
        })?;

        let slots = staged.iter().filter_map(|s| s.assigned.as_ref());
        for (slot, id) in slots.zip(applied.generated_ids.iter()) {
            slot.assign(*id);
        }

        info!(
            "Committed {} staged change(s), {} row(s) affected",
            changes.len(),
            applied.affected
        );
        Ok(applied.affected)
    }

    fn queue(&self) -> MutexGuard<'_, Vec<Staged>> {
        self.staged.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn push_insert(queue: &mut Vec<Staged>, change: Change) -> AssignedId {
    let assigned = AssignedId::default();
    queue.push(Staged {
        change,
        assigned: Some(assigned.clone()),
    });
    assigned
}
