// libs/appointment-cell/src/services/booking.rs
use chrono::{NaiveDate, NaiveTime};
use reqwest::Method;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::{debug, info};

use shared_config::AppConfig;
use shared_database::postgrest::StoreClient;
use shared_models::time::parse_hhmm;

use crate::models::{
    Appointment, AppointmentError, AppointmentQueryParams, AppointmentStatus,
    AppointmentSummary, CreateAppointmentRequest, UpdateAppointmentRequest,
};
use crate::services::conflict::ConflictDetectionService;
use crate::services::locking::SchedulingLockService;

const LIST_SELECT: &str = "select=appointment_id,appointment_date,appointment_time,status,\
patient:patient(patient_id,first_name,last_name),doctor:doctor(doctor_id,first_name,last_name)";

/// Appointment lifecycle: create, partial update, cancel, no-show. Every
/// write that can move an appointment within a doctor's day runs its
/// conflict check under the (doctor, date) scheduling lock.
pub struct AppointmentBookingService {
    store: Arc<StoreClient>,
    conflicts: ConflictDetectionService,
    locks: SchedulingLockService,
}

impl AppointmentBookingService {
    pub fn new(config: &AppConfig) -> Self {
        let store = Arc::new(StoreClient::new(config));
        Self {
            conflicts: ConflictDetectionService::new(store.clone()),
            locks: SchedulingLockService::new(store.clone()),
            store,
        }
    }

    pub async fn create(
        &self,
        request: CreateAppointmentRequest,
    ) -> Result<Appointment, AppointmentError> {
        let patient_id = request
            .patient_id
            .ok_or_else(|| validation("patient_id is required"))?;
        let doctor_id = request
            .doctor_id
            .ok_or_else(|| validation("doctor_id is required"))?;
        let date = parse_date(
            request
                .appointment_date
                .as_deref()
                .ok_or_else(|| validation("appointment_date is required"))?,
        )?;
        let time = parse_time(
            request
                .appointment_time
                .as_deref()
                .ok_or_else(|| validation("appointment_time is required"))?,
        )?;
        let status: AppointmentStatus = request.status.as_deref().unwrap_or("scheduled").parse()?;

        let lock_key = SchedulingLockService::booking_key(doctor_id, date);
        self.locks.acquire(&lock_key).await?;

        let result = self
            .insert_checked(patient_id, doctor_id, date, time, status)
            .await;

        self.locks.release(&lock_key).await;
        result
    }

    async fn insert_checked(
        &self,
        patient_id: i64,
        doctor_id: i64,
        date: NaiveDate,
        time: NaiveTime,
        status: AppointmentStatus,
    ) -> Result<Appointment, AppointmentError> {
        if self.conflicts.has_conflict(doctor_id, date, time, None).await? {
            return Err(AppointmentError::ConflictDetected);
        }

        let row = json!({
            "patient_id": patient_id,
            "doctor_id": doctor_id,
            "appointment_date": date.to_string(),
            "appointment_time": time.format("%H:%M:%S").to_string(),
            "status": status.to_string(),
        });

        let created: Vec<Appointment> = self
            .store
            .request_returning(Method::POST, "/rest/v1/appointment", Some(row))
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        let appointment = created
            .into_iter()
            .next()
            .ok_or_else(|| AppointmentError::DatabaseError("insert returned no row".to_string()))?;

        info!(
            "Appointment {} booked for doctor {} on {} {}",
            appointment.appointment_id, doctor_id, date, time
        );
        Ok(appointment)
    }

    /// Apply only the supplied fields. Moving the appointment re-runs the
    /// conflict check against the effective (doctor, date, time), excluding
    /// the appointment itself.
    pub async fn update(
        &self,
        appointment_id: i64,
        request: UpdateAppointmentRequest,
    ) -> Result<Appointment, AppointmentError> {
        if request.is_empty() {
            return Err(validation("no fields to update"));
        }

        let current = self.get(appointment_id).await?;

        let mut patch = Map::new();
        if let Some(raw) = request.appointment_date.as_deref() {
            patch.insert("appointment_date".into(), json!(parse_date(raw)?.to_string()));
        }
        if let Some(raw) = request.appointment_time.as_deref() {
            patch.insert(
                "appointment_time".into(),
                json!(parse_time(raw)?.format("%H:%M:%S").to_string()),
            );
        }
        if let Some(doctor_id) = request.doctor_id {
            patch.insert("doctor_id".into(), json!(doctor_id));
        }
        if let Some(raw) = request.status.as_deref() {
            let status: AppointmentStatus = raw.parse()?;
            patch.insert("status".into(), json!(status.to_string()));
        }

        if !request.touches_schedule() {
            return self.apply_patch(appointment_id, Value::Object(patch)).await;
        }

        // Fall back to stored values for anything the caller left out.
        let doctor_id = request.doctor_id.unwrap_or(current.doctor_id);
        let date = match request.appointment_date.as_deref() {
            Some(raw) => parse_date(raw)?,
            None => current.appointment_date,
        };
        let time = match request.appointment_time.as_deref() {
            Some(raw) => parse_time(raw)?,
            None => current.appointment_time,
        };

        let lock_key = SchedulingLockService::booking_key(doctor_id, date);
        self.locks.acquire(&lock_key).await?;

        let result = self
            .update_checked(appointment_id, doctor_id, date, time, Value::Object(patch))
            .await;

        self.locks.release(&lock_key).await;
        result
    }

    async fn update_checked(
        &self,
        appointment_id: i64,
        doctor_id: i64,
        date: NaiveDate,
        time: NaiveTime,
        patch: Value,
    ) -> Result<Appointment, AppointmentError> {
        if self
            .conflicts
            .has_conflict(doctor_id, date, time, Some(appointment_id))
            .await?
        {
            return Err(AppointmentError::ConflictDetected);
        }

        self.apply_patch(appointment_id, patch).await
    }

    pub async fn cancel(&self, appointment_id: i64) -> Result<Appointment, AppointmentError> {
        self.set_status(appointment_id, AppointmentStatus::Cancelled).await
    }

    pub async fn mark_no_show(&self, appointment_id: i64) -> Result<Appointment, AppointmentError> {
        self.set_status(appointment_id, AppointmentStatus::NoShow).await
    }

    pub async fn set_status(
        &self,
        appointment_id: i64,
        status: AppointmentStatus,
    ) -> Result<Appointment, AppointmentError> {
        debug!("Setting appointment {} status to {}", appointment_id, status);
        self.apply_patch(appointment_id, json!({ "status": status.to_string() }))
            .await
    }

    pub async fn get(&self, appointment_id: i64) -> Result<Appointment, AppointmentError> {
        let path = format!(
            "/rest/v1/appointment?appointment_id=eq.{}&select=*",
            appointment_id
        );
        let rows: Vec<Appointment> = self
            .store
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        rows.into_iter().next().ok_or(AppointmentError::NotFound)
    }

    /// Filtered listing with patient/doctor names embedded, ordered by
    /// date then time.
    pub async fn list(
        &self,
        params: &AppointmentQueryParams,
    ) -> Result<Vec<AppointmentSummary>, AppointmentError> {
        let mut path = format!("/rest/v1/appointment?{}", LIST_SELECT);

        if let Some(date) = params.date {
            path.push_str(&format!("&appointment_date=eq.{}", date));
        }
        if let Some(doctor_id) = params.doctor_id {
            path.push_str(&format!("&doctor_id=eq.{}", doctor_id));
        }
        if let Some(raw) = params.status.as_deref() {
            let status: AppointmentStatus = raw.parse()?;
            path.push_str(&format!("&status=eq.{}", status));
        }
        path.push_str("&order=appointment_date.asc,appointment_time.asc");

        self.store
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))
    }

    /// PATCH the row; an empty result means the id does not exist.
    async fn apply_patch(
        &self,
        appointment_id: i64,
        patch: Value,
    ) -> Result<Appointment, AppointmentError> {
        let path = format!("/rest/v1/appointment?appointment_id=eq.{}", appointment_id);
        let updated: Vec<Appointment> = self
            .store
            .request_returning(Method::PATCH, &path, Some(patch))
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        updated.into_iter().next().ok_or(AppointmentError::NotFound)
    }
}

fn validation(msg: &str) -> AppointmentError {
    AppointmentError::ValidationError(msg.to_string())
}

fn parse_date(raw: &str) -> Result<NaiveDate, AppointmentError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| validation(&format!("invalid date '{}', expected YYYY-MM-DD", raw)))
}

fn parse_time(raw: &str) -> Result<NaiveTime, AppointmentError> {
    parse_hhmm(raw).map_err(AppointmentError::ValidationError)
}
