// libs/appointment-cell/src/services/conflict.rs
use chrono::{NaiveDate, NaiveTime};
use reqwest::Method;
use std::sync::Arc;
use tracing::{debug, warn};

use shared_database::postgrest::StoreClient;

use crate::models::{Appointment, AppointmentError};

/// Minimum spacing between two active appointments of the same doctor.
pub const MIN_GAP_MINUTES: i64 = 15;

pub struct ConflictDetectionService {
    store: Arc<StoreClient>,
}

impl ConflictDetectionService {
    pub fn new(store: Arc<StoreClient>) -> Self {
        Self { store }
    }

    /// Check whether a proposed time clashes with any active appointment of
    /// the doctor on that date. Pure read; callers that go on to write must
    /// hold the (doctor, date) scheduling lock across check and write.
    pub async fn has_conflict(
        &self,
        doctor_id: i64,
        date: NaiveDate,
        time: NaiveTime,
        exclude_appointment_id: Option<i64>,
    ) -> Result<bool, AppointmentError> {
        debug!(
            "Checking conflicts for doctor {} on {} at {}",
            doctor_id, date, time
        );

        let existing = self
            .active_appointments(doctor_id, date, exclude_appointment_id)
            .await?;

        let clash = existing
            .iter()
            .find(|apt| minutes_apart(apt.appointment_time, time) < MIN_GAP_MINUTES);

        if let Some(apt) = clash {
            warn!(
                "Conflict detected for doctor {} on {}: appointment {} at {} is within {} minutes",
                doctor_id, date, apt.appointment_id, apt.appointment_time, MIN_GAP_MINUTES
            );
            return Ok(true);
        }

        Ok(false)
    }

    /// Active (scheduled/rescheduled) appointments of a doctor on a date,
    /// optionally excluding one appointment id (self-exclusion on update).
    pub async fn active_appointments(
        &self,
        doctor_id: i64,
        date: NaiveDate,
        exclude_appointment_id: Option<i64>,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let mut path = format!(
            "/rest/v1/appointment?doctor_id=eq.{}&appointment_date=eq.{}&status=in.(scheduled,rescheduled)&select=*",
            doctor_id, date
        );

        if let Some(exclude_id) = exclude_appointment_id {
            path.push_str(&format!("&appointment_id=neq.{}", exclude_id));
        }

        self.store
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))
    }
}

fn minutes_apart(a: NaiveTime, b: NaiveTime) -> i64 {
    (a - b).num_minutes().abs()
}
