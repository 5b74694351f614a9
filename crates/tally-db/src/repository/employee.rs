//! # Employee Repository
//!
//! Database operations for employee records. Credentials never touch this
//! table; the external identity provider owns them.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use tally_core::Employee;

const EMPLOYEE_COLUMNS: &str = "id, name, email, role, salary_cents, phone, address, \
     is_active, joined_at, last_login, created_at, updated_at";

/// Repository for employee database operations.
#[derive(Debug, Clone)]
pub struct EmployeeRepository {
    pool: SqlitePool,
}

impl EmployeeRepository {
    /// Creates a new EmployeeRepository.
    pub fn new(pool: SqlitePool) -> Self {
        EmployeeRepository { pool }
    }

    /// Inserts a new employee.
    ///
    /// ## Errors
    /// - `UniqueViolation` when the email is already registered
    pub async fn insert(&self, employee: &Employee) -> DbResult<()> {
        debug!(id = %employee.id, email = %employee.email, "Inserting employee");

        sqlx::query(
            r#"
            INSERT INTO employees (
                id, name, email, role, salary_cents, phone, address,
                is_active, joined_at, last_login, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        )
        .bind(&employee.id)
        .bind(&employee.name)
        .bind(&employee.email)
        .bind(employee.role)
        .bind(employee.salary_cents)
        .bind(&employee.phone)
        .bind(&employee.address)
        .bind(employee.is_active)
        .bind(employee.joined_at)
        .bind(employee.last_login)
        .bind(employee.created_at)
        .bind(employee.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets an employee by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Employee>> {
        let employee = sqlx::query_as::<_, Employee>(&format!(
            "SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(employee)
    }

    /// Gets an employee by email (case-sensitive; emails are stored
    /// lowercased by the service layer).
    pub async fn get_by_email(&self, email: &str) -> DbResult<Option<Employee>> {
        let employee = sqlx::query_as::<_, Employee>(&format!(
            "SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE email = ?1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(employee)
    }

    /// Lists all employees, longest-serving first.
    pub async fn list(&self) -> DbResult<Vec<Employee>> {
        let employees = sqlx::query_as::<_, Employee>(&format!(
            "SELECT {EMPLOYEE_COLUMNS} FROM employees ORDER BY joined_at, name"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(employees)
    }

    /// Deletes an employee record.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting employee");

        let result = sqlx::query("DELETE FROM employees WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Employee", id));
        }

        Ok(())
    }

    /// Counts active employees (dashboard tile).
    pub async fn count_active(&self) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM employees WHERE is_active = 1")
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    /// Records a successful login time.
    pub async fn touch_last_login(&self, id: &str, at: DateTime<Utc>) -> DbResult<()> {
        let result =
            sqlx::query("UPDATE employees SET last_login = ?2, updated_at = ?2 WHERE id = ?1")
                .bind(id)
                .bind(at)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Employee", id));
        }

        Ok(())
    }
}

/// Helper to generate a new employee ID.
pub fn generate_employee_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use tally_core::Role;

    fn sample_employee(email: &str) -> Employee {
        let now = Utc::now();
        Employee {
            id: generate_employee_id(),
            name: "Sana Iqbal".to_string(),
            email: email.to_string(),
            role: Role::Employee,
            salary_cents: Some(3_500_000),
            phone: Some("0300-1234567".to_string()),
            address: None,
            is_active: true,
            joined_at: now,
            last_login: None,
            created_at: now,
            updated_at: now,
        }
    }

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_lookup() {
        let db = test_db().await;
        let employee = sample_employee("sana@example.com");
        db.employees().insert(&employee).await.unwrap();

        let by_id = db.employees().get_by_id(&employee.id).await.unwrap().unwrap();
        assert_eq!(by_id.email, "sana@example.com");

        let by_email = db
            .employees()
            .get_by_email("sana@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_email.id, employee.id);
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let db = test_db().await;
        db.employees()
            .insert(&sample_employee("dup@example.com"))
            .await
            .unwrap();

        let err = db
            .employees()
            .insert(&sample_employee("dup@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_count_active() {
        let db = test_db().await;
        db.employees()
            .insert(&sample_employee("a@example.com"))
            .await
            .unwrap();

        let mut inactive = sample_employee("b@example.com");
        inactive.is_active = false;
        db.employees().insert(&inactive).await.unwrap();

        assert_eq!(db.employees().count_active().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_touch_last_login() {
        let db = test_db().await;
        let employee = sample_employee("login@example.com");
        db.employees().insert(&employee).await.unwrap();

        let at = Utc::now();
        db.employees().touch_last_login(&employee.id, at).await.unwrap();

        let stored = db.employees().get_by_id(&employee.id).await.unwrap().unwrap();
        assert!(stored.last_login.is_some());
    }

    #[tokio::test]
    async fn test_delete_missing() {
        let db = test_db().await;
        let err = db.employees().delete("nope").await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
