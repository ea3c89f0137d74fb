// libs/auth-cell/src/models.rs
use serde::{Deserialize, Serialize};
use std::fmt;

use shared_models::error::AppError;

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Doctor,
    Owner,
    Staff,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Doctor => write!(f, "doctor"),
            Role::Owner => write!(f, "owner"),
            Role::Staff => write!(f, "staff"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DoctorAccount {
    pub doctor_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub username: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmployeeAccount {
    pub employee_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub position: String,
}

/// Who logged in, password already stripped.
#[derive(Debug, Clone, Serialize)]
pub struct AuthenticatedUser {
    pub id: i64,
    pub name: String,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
}

#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub role: Role,
    pub user: AuthenticatedUser,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum AuthError {
    #[error("กรุณากรอกข้อมูลให้ครบถ้วน")]
    MissingCredentials,

    #[error("ชื่อผู้ใช้หรือรหัสผ่านไม่ถูกต้อง")]
    InvalidCredentials,

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingCredentials => AppError::Validation(err.to_string()),
            AuthError::InvalidCredentials => AppError::Auth(err.to_string()),
            AuthError::DatabaseError(msg) => AppError::Database(msg),
        }
    }
}
