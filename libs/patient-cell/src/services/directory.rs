// libs/patient-cell/src/services/directory.rs
//
// Patient directory: front-desk search, per-patient treatment history, and
// the compact summary the chat bot reads back.

use reqwest::Method;
use std::sync::Arc;
use tracing::debug;

use shared_config::AppConfig;
use shared_database::postgrest::StoreClient;

use crate::models::{
    PatientError, PatientSummary, PatientWithVisits, RecentTreatment, TreatmentRecord,
};

const DIRECTORY_SELECT: &str =
    "patient_id,first_name,last_name,birth_date,phone,treatment(treatment_date)";

const RECORD_SELECT: &str = "treatment_id,treatment_date,diagnosis,advice,\
doctor:doctor(doctor_id,first_name,last_name)";

/// How many treatments the bot summary quotes.
const SUMMARY_HISTORY_LIMIT: usize = 5;

pub struct PatientDirectoryService {
    store: Arc<StoreClient>,
}

impl PatientDirectoryService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            store: Arc::new(StoreClient::new(config)),
        }
    }

    /// Directory search. The term matches first name, last name, phone, or
    /// the HN card number. Newest patients first.
    pub async fn search(&self, q: Option<&str>) -> Result<Vec<PatientWithVisits>, PatientError> {
        let q = q.map(str::trim).unwrap_or("");
        let mut path = format!(
            "/rest/v1/patient?select={}&order=patient_id.desc",
            DIRECTORY_SELECT
        );

        if !q.is_empty() {
            let pattern = format!("*{}*", q);
            let mut filters = vec![
                format!("first_name.ilike.{}", pattern),
                format!("last_name.ilike.{}", pattern),
                format!("phone.ilike.{}", pattern),
            ];
            if let Some(id) = hn_to_patient_id(q) {
                filters.push(format!("patient_id.eq.{}", id));
            }
            path.push_str(&format!(
                "&or=({})",
                urlencoding::encode(&filters.join(","))
            ));
        }

        debug!("Patient directory search: q='{}'", q);
        self.store
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| PatientError::DatabaseError(e.to_string()))
    }

    /// Full treatment history for one patient, newest first.
    pub async fn records(&self, patient_id: i64) -> Result<Vec<TreatmentRecord>, PatientError> {
        let path = format!(
            "/rest/v1/treatment?patient_id=eq.{}&select={}&order=treatment_date.desc,treatment_id.desc",
            patient_id, RECORD_SELECT
        );
        self.store
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| PatientError::DatabaseError(e.to_string()))
    }

    /// The patient plus their latest treatments, for the chat bot.
    pub async fn summary(&self, patient_id: i64) -> Result<PatientSummary, PatientError> {
        let path = format!("/rest/v1/patient?patient_id=eq.{}&select=*", patient_id);
        let patients: Vec<crate::models::Patient> = self
            .store
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| PatientError::DatabaseError(e.to_string()))?;
        let patient = patients.into_iter().next().ok_or(PatientError::NotFound)?;

        let path = format!(
            "/rest/v1/treatment?patient_id=eq.{}&select=treatment_date,diagnosis,advice&order=treatment_date.desc&limit={}",
            patient_id, SUMMARY_HISTORY_LIMIT
        );
        let recent_treatments: Vec<RecentTreatment> = self
            .store
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| PatientError::DatabaseError(e.to_string()))?;

        Ok(PatientSummary {
            patient,
            recent_treatments,
        })
    }
}

/// "HN007", "hn7", or plain "7" all resolve to patient 7. Anything with
/// non-digits after the prefix is treated as a name search instead.
fn hn_to_patient_id(q: &str) -> Option<i64> {
    let digits = q
        .strip_prefix("HN")
        .or_else(|| q.strip_prefix("hn"))
        .unwrap_or(q);
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}
