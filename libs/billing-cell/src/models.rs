// libs/billing-cell/src/models.rs
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use shared_models::error::AppError;
use shared_models::time::hhmm;

// ==============================================================================
// TREATMENT / PAYMENT MODELS
// ==============================================================================

/// A recorded consultation outcome. At most one treatment exists per
/// appointment, and it is immutable once written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Treatment {
    pub treatment_id: i64,
    pub patient_id: i64,
    pub doctor_id: i64,
    pub appointment_id: i64,
    #[serde(default)]
    pub symptom: Option<String>,
    pub diagnosis: String,
    pub advice: String,
    pub treatment_date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub payment_id: i64,
    pub patient_id: i64,
    pub appointment_id: i64,
    pub amount: f64,
    pub payment_method: PaymentMethod,
    pub payment_date: Option<NaiveDate>,
    pub status: PaymentStatus,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Credit,
    Transfer,
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentMethod::Cash => write!(f, "cash"),
            PaymentMethod::Credit => write!(f, "credit"),
            PaymentMethod::Transfer => write!(f, "transfer"),
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = BillingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cash" => Ok(PaymentMethod::Cash),
            "credit" => Ok(PaymentMethod::Credit),
            "transfer" => Ok(PaymentMethod::Transfer),
            other => Err(BillingError::ValidationError(format!(
                "payment_method must be cash/credit/transfer, got '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Unpaid,
    Paid,
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentStatus::Unpaid => write!(f, "unpaid"),
            PaymentStatus::Paid => write!(f, "paid"),
        }
    }
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTreatmentRequest {
    pub appointment_id: Option<i64>,
    pub symptom: Option<String>,
    pub diagnosis: Option<String>,
    pub advice: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PayRequest {
    pub amount: Option<f64>,
    pub payment_method: Option<String>,
}

/// What the workflow hands back: ids of everything it touched or created.
#[derive(Debug, Clone, Serialize)]
pub struct TreatmentWorkflowOutcome {
    pub treatment_id: i64,
    pub appointment_id: i64,
    pub payment_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnpaidAppointmentRef {
    pub appointment_id: i64,
    pub appointment_date: NaiveDate,
    #[serde(with = "hhmm")]
    pub appointment_time: chrono::NaiveTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnpaidPatientRef {
    pub patient_id: i64,
    pub first_name: String,
    pub last_name: String,
}

/// Counter-desk queue row: an unpaid payment with its appointment and patient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnpaidPayment {
    pub payment_id: i64,
    pub amount: f64,
    pub status: PaymentStatus,
    pub appointment: UnpaidAppointmentRef,
    pub patient: UnpaidPatientRef,
}

impl UnpaidPayment {
    pub fn patient_full_name(&self) -> String {
        format!("{} {}", self.patient.first_name, self.patient.last_name)
    }
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, thiserror::Error)]
pub enum BillingError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Treatment already recorded for this appointment (treatment {treatment_id})")]
    DuplicateTreatment { treatment_id: i64 },

    #[error("Appointment is being processed by another request")]
    Contended,

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<BillingError> for AppError {
    fn from(err: BillingError) -> Self {
        match err {
            BillingError::ValidationError(msg) => AppError::Validation(msg),
            BillingError::NotFound(what) => AppError::NotFound(format!("{} not found", what)),
            BillingError::DuplicateTreatment { treatment_id } => AppError::Conflict(format!(
                "Treatment already recorded for this appointment (treatment {})",
                treatment_id
            )),
            BillingError::Contended => {
                AppError::Conflict("Appointment is being processed by another request".to_string())
            }
            BillingError::DatabaseError(msg) => AppError::Database(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_method_parses_the_three_supported_kinds() {
        assert_eq!("cash".parse::<PaymentMethod>().unwrap(), PaymentMethod::Cash);
        assert_eq!("credit".parse::<PaymentMethod>().unwrap(), PaymentMethod::Credit);
        assert_eq!("transfer".parse::<PaymentMethod>().unwrap(), PaymentMethod::Transfer);
        assert!("cheque".parse::<PaymentMethod>().is_err());
    }

    #[test]
    fn payment_deserializes_store_row_with_null_date() {
        let row = serde_json::json!({
            "payment_id": 3,
            "patient_id": 1,
            "appointment_id": 9,
            "amount": 0.0,
            "payment_method": "cash",
            "payment_date": null,
            "status": "unpaid"
        });
        let payment: Payment = serde_json::from_value(row).unwrap();
        assert_eq!(payment.status, PaymentStatus::Unpaid);
        assert!(payment.payment_date.is_none());
    }
}
