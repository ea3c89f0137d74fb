// libs/auth-cell/src/services/login.rs
//
// Clinic login: doctors first, then front-desk employees. Credentials are
// matched against the stored value as-is; the employee position decides
// whether staff get the owner role.

use reqwest::Method;
use std::sync::Arc;
use tracing::info;

use shared_config::AppConfig;
use shared_database::postgrest::StoreClient;

use crate::models::{
    AuthError, AuthenticatedUser, DoctorAccount, EmployeeAccount, LoginOutcome, LoginRequest, Role,
};

pub struct LoginService {
    store: Arc<StoreClient>,
}

impl LoginService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            store: Arc::new(StoreClient::new(config)),
        }
    }

    pub async fn login(&self, request: LoginRequest) -> Result<LoginOutcome, AuthError> {
        let username = request
            .username
            .map(|u| u.trim().to_string())
            .unwrap_or_default();
        let password = request.password.unwrap_or_default();
        if username.is_empty() || password.is_empty() {
            return Err(AuthError::MissingCredentials);
        }

        if let Some(doctor) = self.find_doctor(&username, &password).await? {
            info!("Doctor {} logged in", doctor.doctor_id);
            return Ok(LoginOutcome {
                role: Role::Doctor,
                user: AuthenticatedUser {
                    id: doctor.doctor_id,
                    name: format!("{} {}", doctor.first_name, doctor.last_name),
                    username: doctor.username,
                    position: None,
                },
            });
        }

        if let Some(employee) = self.find_employee(&username, &password).await? {
            let role = if employee.position == "owner" {
                Role::Owner
            } else {
                Role::Staff
            };
            info!("Employee {} logged in as {}", employee.employee_id, role);
            return Ok(LoginOutcome {
                role,
                user: AuthenticatedUser {
                    id: employee.employee_id,
                    name: format!("{} {}", employee.first_name, employee.last_name),
                    username: employee.username,
                    position: Some(employee.position),
                },
            });
        }

        Err(AuthError::InvalidCredentials)
    }

    async fn find_doctor(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<DoctorAccount>, AuthError> {
        let path = format!(
            "/rest/v1/doctor?username=eq.{}&password=eq.{}&select=doctor_id,first_name,last_name,username&limit=1",
            urlencoding::encode(username),
            urlencoding::encode(password)
        );
        let rows: Vec<DoctorAccount> = self
            .store
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| AuthError::DatabaseError(e.to_string()))?;
        Ok(rows.into_iter().next())
    }

    async fn find_employee(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<EmployeeAccount>, AuthError> {
        let path = format!(
            "/rest/v1/employee?username=eq.{}&password=eq.{}&select=employee_id,first_name,last_name,username,position&limit=1",
            urlencoding::encode(username),
            urlencoding::encode(password)
        );
        let rows: Vec<EmployeeAccount> = self
            .store
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| AuthError::DatabaseError(e.to_string()))?;
        Ok(rows.into_iter().next())
    }
}
