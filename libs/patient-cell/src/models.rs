// libs/patient-cell/src/models.rs
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

use shared_models::error::AppError;

// ==============================================================================
// PATIENT MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    pub patient_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub birth_date: NaiveDate,
    pub phone: String,
}

impl Patient {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Hospital number shown on cards and used in search: HN001, HN042, ...
    pub fn hn(&self) -> String {
        format!("HN{:03}", self.patient_id)
    }

    pub fn age(&self) -> u32 {
        Local::now()
            .date_naive()
            .years_since(self.birth_date)
            .unwrap_or(0)
    }
}

/// Store row for the directory listing: a patient with the dates of every
/// treatment, embedded so the last visit can be computed without extra trips.
#[derive(Debug, Clone, Deserialize)]
pub struct PatientWithVisits {
    #[serde(flatten)]
    pub patient: Patient,
    #[serde(default, rename = "treatment")]
    pub visits: Vec<VisitDate>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VisitDate {
    pub treatment_date: NaiveDate,
}

impl PatientWithVisits {
    pub fn last_visit(&self) -> Option<NaiveDate> {
        self.visits.iter().map(|v| v.treatment_date).max()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PatientQueryParams {
    pub q: Option<String>,
}

/// One line of a patient's treatment history, doctor embedded.
#[derive(Debug, Clone, Deserialize)]
pub struct TreatmentRecord {
    pub treatment_id: i64,
    pub treatment_date: NaiveDate,
    pub diagnosis: String,
    pub advice: String,
    pub doctor: DoctorRef,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorRef {
    pub doctor_id: i64,
    pub first_name: String,
    pub last_name: String,
}

impl TreatmentRecord {
    pub fn doctor_full_name(&self) -> String {
        format!("{} {}", self.doctor.first_name, self.doctor.last_name)
    }
}

/// A patient plus their most recent treatments, as the chat bot reports them.
#[derive(Debug, Clone, Serialize)]
pub struct PatientSummary {
    pub patient: Patient,
    pub recent_treatments: Vec<RecentTreatment>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecentTreatment {
    pub treatment_date: NaiveDate,
    pub diagnosis: String,
    pub advice: String,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, thiserror::Error)]
pub enum PatientError {
    #[error("Patient not found")]
    NotFound,

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<PatientError> for AppError {
    fn from(err: PatientError) -> Self {
        match err {
            PatientError::NotFound => AppError::NotFound("Patient not found".to_string()),
            PatientError::DatabaseError(msg) => AppError::Database(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patient(id: i64) -> Patient {
        Patient {
            patient_id: id,
            first_name: "สมชาย".to_string(),
            last_name: "ทดสอบ".to_string(),
            birth_date: NaiveDate::from_ymd_opt(1990, 4, 2).unwrap(),
            phone: "0812345678".to_string(),
        }
    }

    #[test]
    fn hn_is_zero_padded_to_three_digits() {
        assert_eq!(patient(1).hn(), "HN001");
        assert_eq!(patient(42).hn(), "HN042");
        assert_eq!(patient(1234).hn(), "HN1234");
    }

    #[test]
    fn last_visit_is_the_latest_treatment_date() {
        let row = PatientWithVisits {
            patient: patient(1),
            visits: vec![
                VisitDate {
                    treatment_date: NaiveDate::from_ymd_opt(2025, 10, 1).unwrap(),
                },
                VisitDate {
                    treatment_date: NaiveDate::from_ymd_opt(2025, 11, 13).unwrap(),
                },
            ],
        };
        assert_eq!(
            row.last_visit(),
            NaiveDate::from_ymd_opt(2025, 11, 13)
        );

        let no_visits = PatientWithVisits {
            patient: patient(2),
            visits: vec![],
        };
        assert_eq!(no_visits.last_visit(), None);
    }
}
