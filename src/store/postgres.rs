use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool, Postgres, Row, Transaction};

use crate::models::department::Department;
use crate::models::employee::Employee;
use crate::store::{resolve_department, Applied, Change, EntityStore, StoreError, StoreResult};

const EMPLOYEE_COLUMNS: &str = "id, name, age, address, phone, salary, email, is_active, image_name, department_id, created_at";

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        let code = match &err {
            sqlx::Error::Database(db_err) => db_err.code().map(|c| c.into_owned()),
            _ => None,
        };
        match code.as_deref() {
            // class 23: integrity constraint violation
            Some(code) if code.starts_with("23") => StoreError::ConstraintViolation(err.to_string()),
            Some("40001") | Some("40P01") => StoreError::ConcurrencyConflict(err.to_string()),
            _ => StoreError::Database(err),
        }
    }
}

/// Postgres-backed store. Each batch runs in its own transaction.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies `changes[position]`, returning the id it generated, if any.
    async fn apply_one(
        tx: &mut Transaction<'static, Postgres>,
        changes: &[Change],
        generated: &[Option<i64>],
        position: usize,
        applied: &mut Applied,
    ) -> StoreResult<Option<i64>> {
        match &changes[position] {
            Change::InsertEmployee { employee: e, staged_department } => {
                let department_id = resolve_department(changes, generated, e, *staged_department)?;
                let id: i64 = sqlx::query_scalar(
                    "INSERT INTO employees (name, age, address, phone, salary, email, is_active, image_name, department_id, created_at) \
                     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING id",
                )
                .bind(&e.name)
                .bind(e.age)
                .bind(&e.address)
                .bind(&e.phone)
                .bind(e.salary)
                .bind(&e.email)
                .bind(e.is_active)
                .bind(&e.image_name)
                .bind(department_id)
                .bind(e.created_at)
                .fetch_one(&mut **tx)
                .await?;
                applied.generated_ids.push(id);
                applied.affected += 1;
                return Ok(Some(id));
            }
            Change::UpdateEmployee(e) => {
                let result = sqlx::query(
                    "UPDATE employees SET name = $1, age = $2, address = $3, phone = $4, salary = $5, email = $6, \
                     is_active = $7, image_name = $8, department_id = $9, created_at = $10 WHERE id = $11",
                )
                .bind(&e.name)
                .bind(e.age)
                .bind(&e.address)
                .bind(&e.phone)
                .bind(e.salary)
                .bind(&e.email)
                .bind(e.is_active)
                .bind(&e.image_name)
                .bind(e.department_id)
                .bind(e.created_at)
                .bind(e.id)
                .execute(&mut **tx)
                .await?;
                applied.affected += result.rows_affected();
            }
            Change::DeleteEmployee(id) => {
                let result = sqlx::query("DELETE FROM employees WHERE id = $1")
                    .bind(id)
                    .execute(&mut **tx)
                    .await?;
                applied.affected += result.rows_affected();
            }
            Change::InsertDepartment(d) => {
                let id: i64 = sqlx::query_scalar(
                    "INSERT INTO departments (name, code, created_at) VALUES ($1, $2, $3) RETURNING id",
                )
                .bind(&d.name)
                .bind(&d.code)
                .bind(d.created_at)
                .fetch_one(&mut **tx)
                .await?;
                applied.generated_ids.push(id);
                applied.affected += 1;
                return Ok(Some(id));
            }
            Change::UpdateDepartment(d) => {
                let result = sqlx::query(
                    "UPDATE departments SET name = $1, code = $2, created_at = $3 WHERE id = $4",
                )
                .bind(&d.name)
                .bind(&d.code)
                .bind(d.created_at)
                .bind(d.id)
                .execute(&mut **tx)
                .await?;
                applied.affected += result.rows_affected();
            }
            Change::DeleteDepartment(id) => {
                let result = sqlx::query("DELETE FROM departments WHERE id = $1")
                    .bind(id)
                    .execute(&mut **tx)
                    .await?;
                applied.affected += result.rows_affected();
            }
        }
        Ok(None)
    }
}

fn employee_with_department(row: &PgRow) -> Result<Employee, sqlx::Error> {
    let mut employee = Employee::from_row(row)?;
    let department_name: Option<String> = row.try_get("department_name")?;
    if let (Some(id), Some(name)) = (employee.department_id, department_name) {
        employee.department = Some(Department {
            id,
            name,
            code: row.try_get("department_code")?,
            created_at: row.try_get("department_created_at")?,
            employees: None,
        });
    }
    Ok(employee)
}

#[async_trait]
impl EntityStore for PgStore {
    async fn find_employee(&self, id: i64) -> StoreResult<Option<Employee>> {
        let sql = format!("SELECT {} FROM employees WHERE id = $1", EMPLOYEE_COLUMNS);
        Ok(sqlx::query_as::<_, Employee>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list_employees(&self, name_filter: Option<&str>) -> StoreResult<Vec<Employee>> {
        let mut query_builder: sqlx::QueryBuilder<'_, Postgres> =
            sqlx::QueryBuilder::new(format!("SELECT {} FROM employees", EMPLOYEE_COLUMNS));

        if let Some(term) = name_filter.filter(|t| !t.is_empty()) {
            // strpos avoids treating % and _ in the term as wildcards
            query_builder.push(" WHERE strpos(lower(name), lower(");
            query_builder.push_bind(term);
            query_builder.push(")) > 0");
        }
        query_builder.push(" ORDER BY id");

        Ok(query_builder
            .build_query_as::<Employee>()
            .fetch_all(&self.pool)
            .await?)
    }

    async fn list_employees_with_departments(&self) -> StoreResult<Vec<Employee>> {
        let rows = sqlx::query(
            "SELECT e.id, e.name, e.age, e.address, e.phone, e.salary, e.email, e.is_active, e.image_name, \
             e.department_id, e.created_at, d.name AS department_name, d.code AS department_code, \
             d.created_at AS department_created_at \
             FROM employees e LEFT JOIN departments d ON d.id = e.department_id ORDER BY e.id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(employee_with_department)
            .collect::<Result<Vec<_>, _>>()?)
    }

    async fn find_department(&self, id: i64) -> StoreResult<Option<Department>> {
        Ok(sqlx::query_as::<_, Department>(
            "SELECT id, name, code, created_at FROM departments WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn find_department_with_employees(&self, id: i64) -> StoreResult<Option<Department>> {
        let Some(mut department) = self.find_department(id).await? else {
            return Ok(None);
        };
        let sql = format!(
            "SELECT {} FROM employees WHERE department_id = $1 ORDER BY id",
            EMPLOYEE_COLUMNS
        );
        let employees = sqlx::query_as::<_, Employee>(&sql)
            .bind(id)
            .fetch_all(&self.pool)
            .await?;
        department.employees = Some(employees);
        Ok(Some(department))
    }

    async fn list_departments(&self) -> StoreResult<Vec<Department>> {
        Ok(sqlx::query_as::<_, Department>(
            "SELECT id, name, code, created_at FROM departments ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?)
    }

    async fn apply(&self, changes: &[Change]) -> StoreResult<Applied> {
        let mut tx = self.pool.begin().await?;
        let mut applied = Applied::default();
        let mut generated = Vec::with_capacity(changes.len());
        for position in 0..changes.len() {
            // dropping tx on error rolls the whole batch back
            let id = Self::apply_one(&mut tx, changes, &generated, position, &mut applied).await?;
            generated.push(id);
        }
        tx.commit().await?;
        Ok(applied)
    }
}
