use std::sync::{Arc, OnceLock};

use log::warn;

use crate::repositories::{DepartmentRepository, EmployeeRepository};
use crate::store::{EntityStore, Session, StoreResult};

/// Scope for one unit of work, normally one request.
///
/// Owns a single [`Session`]; both repositories are built over that session
/// the first time they are asked for and reused afterwards, so everything
/// staged through them lands in the same commit. Dropping the unit of work
/// (or calling [`dispose`](Self::dispose)) ends the scope and throws away
/// anything not yet saved.
pub struct UnitOfWork {
    session: Arc<Session>,
    employees: OnceLock<EmployeeRepository>,
    departments: OnceLock<DepartmentRepository>,
}

impl UnitOfWork {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self {
            session: Arc::new(Session::new(store)),
            employees: OnceLock::new(),
            departments: OnceLock::new(),
        }
    }

    pub fn employees(&self) -> &EmployeeRepository {
        self.employees
            .get_or_init(|| EmployeeRepository::new(Arc::clone(&self.session)))
    }

    pub fn departments(&self) -> &DepartmentRepository {
        self.departments
            .get_or_init(|| DepartmentRepository::new(Arc::clone(&self.session)))
    }

    /// Commits everything staged so far and returns the affected row count.
    /// Zero means nothing changed. Store errors come back unchanged.
    pub async fn save_changes(&self) -> StoreResult<u64> {
        self.session.save_changes().await
    }

    pub fn pending_changes(&self) -> usize {
        self.session.pending()
    }

    /// Ends the scope, returning how many staged changes were discarded.
    pub fn dispose(self) -> usize {
        self.session.discard()
    }
}

impl Drop for UnitOfWork {
    fn drop(&mut self) {
        let discarded = self.session.discard();
        if discarded > 0 {
            warn!("Unit of work closed with {} unsaved change(s)", discarded);
        }
    }
}
