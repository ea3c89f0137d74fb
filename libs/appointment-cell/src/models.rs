// libs/appointment-cell/src/models.rs
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use shared_models::error::AppError;
use shared_models::time::hhmm;

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

/// A booked visit as stored in the `appointment` table. Appointments are
/// never physically deleted; terminal outcomes are expressed through `status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub appointment_id: i64,
    pub patient_id: i64,
    pub doctor_id: i64,
    pub appointment_date: NaiveDate,
    #[serde(with = "hhmm")]
    pub appointment_time: NaiveTime,
    pub status: AppointmentStatus,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Scheduled,
    Completed,
    Cancelled,
    NoShow,
    Rescheduled,
}

impl AppointmentStatus {
    /// Active appointments are the ones that occupy a doctor's time and
    /// therefore count toward conflict checks and slot suggestions.
    pub fn is_active(&self) -> bool {
        matches!(self, AppointmentStatus::Scheduled | AppointmentStatus::Rescheduled)
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Scheduled => write!(f, "scheduled"),
            AppointmentStatus::Completed => write!(f, "completed"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
            AppointmentStatus::NoShow => write!(f, "no_show"),
            AppointmentStatus::Rescheduled => write!(f, "rescheduled"),
        }
    }
}

impl FromStr for AppointmentStatus {
    type Err = AppointmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(AppointmentStatus::Scheduled),
            "completed" => Ok(AppointmentStatus::Completed),
            "cancelled" => Ok(AppointmentStatus::Cancelled),
            "no_show" => Ok(AppointmentStatus::NoShow),
            "rescheduled" => Ok(AppointmentStatus::Rescheduled),
            other => Err(AppointmentError::ValidationError(format!(
                "status must be one of scheduled/completed/cancelled/no_show/rescheduled, got '{}'",
                other
            ))),
        }
    }
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

/// Booking request as the front-end sends it. Dates and times arrive as
/// strings and are validated into typed values at the service boundary.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateAppointmentRequest {
    pub patient_id: Option<i64>,
    pub doctor_id: Option<i64>,
    pub appointment_date: Option<String>,
    pub appointment_time: Option<String>,
    pub status: Option<String>,
}

/// Partial update; only supplied fields are applied.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateAppointmentRequest {
    pub appointment_date: Option<String>,
    pub appointment_time: Option<String>,
    pub doctor_id: Option<i64>,
    pub status: Option<String>,
}

impl UpdateAppointmentRequest {
    pub fn is_empty(&self) -> bool {
        self.appointment_date.is_none()
            && self.appointment_time.is_none()
            && self.doctor_id.is_none()
            && self.status.is_none()
    }

    /// True when the update can move the appointment within a doctor's day
    /// (or to another doctor), which forces a fresh conflict check.
    pub fn touches_schedule(&self) -> bool {
        self.appointment_date.is_some()
            || self.appointment_time.is_some()
            || self.doctor_id.is_some()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppointmentQueryParams {
    pub date: Option<NaiveDate>,
    pub doctor_id: Option<i64>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientRef {
    pub patient_id: i64,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorRef {
    pub doctor_id: i64,
    pub first_name: String,
    pub last_name: String,
}

/// Listing row with patient/doctor names embedded by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentSummary {
    pub appointment_id: i64,
    pub appointment_date: NaiveDate,
    #[serde(with = "hhmm")]
    pub appointment_time: NaiveTime,
    pub status: AppointmentStatus,
    pub patient: PatientRef,
    pub doctor: DoctorRef,
}

impl AppointmentSummary {
    pub fn patient_full_name(&self) -> String {
        format!("{} {}", self.patient.first_name, self.patient.last_name)
    }

    pub fn doctor_full_name(&self) -> String {
        format!("{} {}", self.doctor.first_name, self.doctor.last_name)
    }
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, thiserror::Error)]
pub enum AppointmentError {
    #[error("Appointment not found")]
    NotFound,

    #[error("Appointment conflicts with an existing booking for this doctor")]
    ConflictDetected,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<AppointmentError> for AppError {
    fn from(err: AppointmentError) -> Self {
        match err {
            AppointmentError::NotFound => AppError::NotFound("Appointment not found".to_string()),
            AppointmentError::ConflictDetected => AppError::Conflict(
                "Doctor already has an appointment within 15 minutes of this time".to_string(),
            ),
            AppointmentError::ValidationError(msg) => AppError::Validation(msg),
            AppointmentError::DatabaseError(msg) => AppError::Database(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_strings() {
        for raw in ["scheduled", "completed", "cancelled", "no_show", "rescheduled"] {
            let status: AppointmentStatus = raw.parse().unwrap();
            assert_eq!(status.to_string(), raw);
        }
    }

    #[test]
    fn unknown_status_is_a_validation_error() {
        let err = "walk_in".parse::<AppointmentStatus>().unwrap_err();
        assert!(matches!(err, AppointmentError::ValidationError(_)));
    }

    #[test]
    fn only_scheduled_and_rescheduled_are_active() {
        assert!(AppointmentStatus::Scheduled.is_active());
        assert!(AppointmentStatus::Rescheduled.is_active());
        assert!(!AppointmentStatus::Completed.is_active());
        assert!(!AppointmentStatus::Cancelled.is_active());
        assert!(!AppointmentStatus::NoShow.is_active());
    }

    #[test]
    fn appointment_deserializes_store_row() {
        let row = serde_json::json!({
            "appointment_id": 7,
            "patient_id": 1,
            "doctor_id": 2,
            "appointment_date": "2025-11-13",
            "appointment_time": "09:00:00",
            "status": "scheduled"
        });
        let appointment: Appointment = serde_json::from_value(row).unwrap();
        assert_eq!(appointment.appointment_id, 7);
        assert_eq!(appointment.appointment_time.format("%H:%M").to_string(), "09:00");
        assert!(appointment.status.is_active());
    }
}
