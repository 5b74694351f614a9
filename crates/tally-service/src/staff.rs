//! # Staff Workflows
//!
//! Employee records and the owner guard. Credentials and session issuance
//! belong to the external identity provider; this module only keeps the
//! roster the dashboard and sale attribution draw on.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{ServiceError, ServiceResult};
use tally_core::{Employee, Principal, Role, ValidationError};
use tally_db::repository::employee::generate_employee_id;
use tally_db::Database;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterEmployeeRequest {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub salary_cents: Option<i64>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

/// Employee roster management.
#[derive(Debug, Clone)]
pub struct StaffService {
    db: Database,
}

impl StaffService {
    pub fn new(db: Database) -> Self {
        StaffService { db }
    }

    fn require_owner(principal: &Principal) -> ServiceResult<()> {
        if principal.role != Role::Owner {
            return Err(ServiceError::forbidden(
                "Only the owner can manage staff",
            ));
        }
        Ok(())
    }

    /// Registers a new employee. Owner only.
    pub async fn register(
        &self,
        principal: &Principal,
        req: RegisterEmployeeRequest,
    ) -> ServiceResult<Employee> {
        Self::require_owner(principal)?;

        let name = req.name.trim();
        if name.is_empty() {
            return Err(ValidationError::Required {
                field: "name".to_string(),
            }
            .into_service());
        }

        let email = req.email.trim().to_lowercase();
        if email.is_empty() || !email.contains('@') {
            return Err(ValidationError::InvalidFormat {
                field: "email".to_string(),
                reason: "must be a valid email address".to_string(),
            }
            .into_service());
        }

        if let Some(salary) = req.salary_cents {
            if salary < 0 {
                return Err(ValidationError::MustBePositive {
                    field: "salary".to_string(),
                }
                .into_service());
            }
        }

        let now = Utc::now();
        let employee = Employee {
            id: generate_employee_id(),
            name: name.to_string(),
            email,
            role: req.role,
            salary_cents: req.salary_cents,
            phone: req.phone,
            address: req.address,
            is_active: true,
            joined_at: now,
            last_login: None,
            created_at: now,
            updated_at: now,
        };

        // Duplicate emails surface as a UniqueViolation from the insert.
        self.db.employees().insert(&employee).await?;

        info!(
            employee_id = %employee.id,
            email = %employee.email,
            ?employee.role,
            "Employee registered"
        );

        Ok(employee)
    }

    /// Lists the staff roster. Owner records are not part of the managed
    /// roster and are excluded.
    pub async fn list(&self) -> ServiceResult<Vec<Employee>> {
        let roster = self.db.employees().list().await?;
        Ok(roster
            .into_iter()
            .filter(|e| e.role != Role::Owner)
            .collect())
    }

    /// Removes an employee record. Owner only; the owner record itself
    /// cannot be removed.
    pub async fn remove(&self, principal: &Principal, employee_id: &str) -> ServiceResult<()> {
        Self::require_owner(principal)?;

        let target = self
            .db
            .employees()
            .get_by_id(employee_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Employee", employee_id))?;
        if target.role == Role::Owner {
            return Err(ServiceError::forbidden("Owner record cannot be removed"));
        }

        self.db.employees().delete(employee_id).await?;
        info!(employee_id = %employee_id, "Employee removed");
        Ok(())
    }

    /// Records a login reported by the identity provider and returns the
    /// principal the rest of the service layer works with.
    pub async fn record_login(&self, email: &str) -> ServiceResult<Principal> {
        let email = email.trim().to_lowercase();
        let employee = self
            .db
            .employees()
            .get_by_email(&email)
            .await?
            .ok_or_else(|| ServiceError::not_found("Employee", &email))?;

        if !employee.is_active {
            return Err(ServiceError::forbidden("Employee account is inactive"));
        }

        self.db
            .employees()
            .touch_last_login(&employee.id, Utc::now())
            .await?;

        Ok(Principal {
            id: employee.id,
            name: employee.name,
            role: employee.role,
        })
    }
}

// Small convenience so validation failures flow into ServiceError without
// going through CoreError first.
trait IntoService {
    fn into_service(self) -> ServiceError;
}

impl IntoService for ValidationError {
    fn into_service(self) -> ServiceError {
        ServiceError::validation(self.to_string())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
