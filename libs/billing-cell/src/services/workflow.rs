// libs/billing-cell/src/services/workflow.rs
//
// Treatment-payment workflow. Recording a treatment is one logical unit:
// insert the treatment row, mark the appointment completed, and ensure an
// unpaid payment stub exists for the counter desk. The whole sequence runs
// under a per-appointment advisory lock, and a failure after the treatment
// insert deletes the new row and restores the previous appointment status
// before the error surfaces.

use chrono::Local;
use reqwest::Method;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use appointment_cell::models::{Appointment, AppointmentError, AppointmentStatus};
use appointment_cell::services::locking::SchedulingLockService;
use shared_config::AppConfig;
use shared_database::postgrest::StoreClient;

use crate::models::{BillingError, CreateTreatmentRequest, Treatment, TreatmentWorkflowOutcome};

pub struct TreatmentWorkflowService {
    store: Arc<StoreClient>,
    locks: SchedulingLockService,
}

impl TreatmentWorkflowService {
    pub fn new(config: &AppConfig) -> Self {
        let store = Arc::new(StoreClient::new(config));
        let locks = SchedulingLockService::new(Arc::clone(&store));
        Self { store, locks }
    }

    /// Record a treatment for an appointment and ensure its payment stub.
    ///
    /// Steps, serialized per appointment:
    /// 1. validate the request fields,
    /// 2. load the appointment (404 when absent),
    /// 3. refuse a second treatment, reporting the existing one,
    /// 4. insert the treatment dated today, copying patient and doctor
    ///    from the appointment,
    /// 5. mark the appointment completed,
    /// 6. create an unpaid cash payment of 0.00 unless one already exists.
    pub async fn create_treatment(
        &self,
        request: CreateTreatmentRequest,
    ) -> Result<TreatmentWorkflowOutcome, BillingError> {
        let appointment_id = request
            .appointment_id
            .ok_or_else(|| BillingError::ValidationError("appointment_id is required".to_string()))?;
        let diagnosis = required_text(request.diagnosis, "diagnosis")?;
        let advice = required_text(request.advice, "advice")?;
        let symptom = request
            .symptom
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        // A held lock means a concurrent attempt on the same appointment;
        // anything else from the lock table is a store problem.
        let lock_key = SchedulingLockService::workflow_key(appointment_id);
        self.locks.acquire(&lock_key).await.map_err(|e| match e {
            AppointmentError::DatabaseError(msg) => BillingError::DatabaseError(msg),
            _ => BillingError::Contended,
        })?;

        let result = self
            .run_workflow(appointment_id, symptom, diagnosis, advice)
            .await;

        self.locks.release(&lock_key).await;
        result
    }

    async fn run_workflow(
        &self,
        appointment_id: i64,
        symptom: Option<String>,
        diagnosis: String,
        advice: String,
    ) -> Result<TreatmentWorkflowOutcome, BillingError> {
        let appointment = self.get_appointment(appointment_id).await?;

        if let Some(treatment_id) = self.existing_treatment_id(appointment_id).await? {
            debug!(
                "Appointment {} already has treatment {}",
                appointment_id, treatment_id
            );
            return Err(BillingError::DuplicateTreatment { treatment_id });
        }

        let treatment = self
            .insert_treatment(&appointment, symptom, diagnosis, advice)
            .await?;

        match self.finalize(&appointment).await {
            Ok(payment_id) => {
                info!(
                    "Treatment {} recorded for appointment {}, payment {}",
                    treatment.treatment_id, appointment_id, payment_id
                );
                Ok(TreatmentWorkflowOutcome {
                    treatment_id: treatment.treatment_id,
                    appointment_id,
                    payment_id,
                })
            }
            Err(e) => {
                error!(
                    "Treatment workflow failed after insert for appointment {}: {}",
                    appointment_id, e
                );
                self.compensate(treatment.treatment_id, &appointment).await;
                Err(e)
            }
        }
    }

    /// Mark the appointment completed, then ensure the payment stub.
    async fn finalize(&self, appointment: &Appointment) -> Result<i64, BillingError> {
        let path = format!(
            "/rest/v1/appointment?appointment_id=eq.{}",
            appointment.appointment_id
        );
        let updated: Vec<Appointment> = self
            .store
            .request_returning(
                Method::PATCH,
                &path,
                Some(json!({ "status": AppointmentStatus::Completed.to_string() })),
            )
            .await
            .map_err(|e| BillingError::DatabaseError(e.to_string()))?;
        if updated.is_empty() {
            return Err(BillingError::DatabaseError(
                "appointment vanished while completing the workflow".to_string(),
            ));
        }

        if let Some(payment_id) = self.existing_payment_id(appointment.appointment_id).await? {
            debug!(
                "Appointment {} already has payment {}",
                appointment.appointment_id, payment_id
            );
            return Ok(payment_id);
        }
        self.insert_payment_stub(appointment).await
    }

    /// Undo the treatment insert and put the appointment status back.
    /// Best-effort: failures are logged, not surfaced over the original error.
    async fn compensate(&self, treatment_id: i64, appointment: &Appointment) {
        let path = format!("/rest/v1/treatment?treatment_id=eq.{}", treatment_id);
        if let Err(e) = self.store.execute(Method::DELETE, &path, None).await {
            warn!(
                "Compensation failed to delete treatment {}: {}",
                treatment_id, e
            );
        }

        let path = format!(
            "/rest/v1/appointment?appointment_id=eq.{}",
            appointment.appointment_id
        );
        if let Err(e) = self
            .store
            .execute(
                Method::PATCH,
                &path,
                Some(json!({ "status": appointment.status.to_string() })),
            )
            .await
        {
            warn!(
                "Compensation failed to restore appointment {} to {}: {}",
                appointment.appointment_id, appointment.status, e
            );
        }
    }

    async fn get_appointment(&self, appointment_id: i64) -> Result<Appointment, BillingError> {
        let path = format!(
            "/rest/v1/appointment?appointment_id=eq.{}&select=*",
            appointment_id
        );
        let rows: Vec<Appointment> = self
            .store
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| BillingError::DatabaseError(e.to_string()))?;
        rows.into_iter()
            .next()
            .ok_or(BillingError::NotFound("Appointment"))
    }

    async fn existing_treatment_id(&self, appointment_id: i64) -> Result<Option<i64>, BillingError> {
        let path = format!(
            "/rest/v1/treatment?appointment_id=eq.{}&select=treatment_id",
            appointment_id
        );
        let rows: Vec<Value> = self
            .store
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| BillingError::DatabaseError(e.to_string()))?;
        Ok(rows
            .first()
            .and_then(|row| row.get("treatment_id"))
            .and_then(|v| v.as_i64()))
    }

    async fn existing_payment_id(&self, appointment_id: i64) -> Result<Option<i64>, BillingError> {
        let path = format!(
            "/rest/v1/payment?appointment_id=eq.{}&select=payment_id",
            appointment_id
        );
        let rows: Vec<Value> = self
            .store
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| BillingError::DatabaseError(e.to_string()))?;
        Ok(rows
            .first()
            .and_then(|row| row.get("payment_id"))
            .and_then(|v| v.as_i64()))
    }

    async fn insert_treatment(
        &self,
        appointment: &Appointment,
        symptom: Option<String>,
        diagnosis: String,
        advice: String,
    ) -> Result<Treatment, BillingError> {
        let row = json!({
            "patient_id": appointment.patient_id,
            "doctor_id": appointment.doctor_id,
            "appointment_id": appointment.appointment_id,
            "symptom": symptom,
            "diagnosis": diagnosis,
            "advice": advice,
            "treatment_date": Local::now().date_naive().to_string(),
        });
        let inserted: Vec<Treatment> = self
            .store
            .request_returning(Method::POST, "/rest/v1/treatment", Some(row))
            .await
            .map_err(|e| BillingError::DatabaseError(e.to_string()))?;
        inserted.into_iter().next().ok_or_else(|| {
            BillingError::DatabaseError("treatment insert returned no row".to_string())
        })
    }

    /// The stub the counter desk settles later: zero amount, cash, unpaid.
    async fn insert_payment_stub(&self, appointment: &Appointment) -> Result<i64, BillingError> {
        let row = json!({
            "patient_id": appointment.patient_id,
            "appointment_id": appointment.appointment_id,
            "amount": 0.00,
            "payment_method": "cash",
            "payment_date": Value::Null,
            "status": "unpaid",
        });
        let inserted: Vec<Value> = self
            .store
            .request_returning(Method::POST, "/rest/v1/payment", Some(row))
            .await
            .map_err(|e| BillingError::DatabaseError(e.to_string()))?;
        inserted
            .first()
            .and_then(|row| row.get("payment_id"))
            .and_then(|v| v.as_i64())
            .ok_or_else(|| BillingError::DatabaseError("payment insert returned no row".to_string()))
    }
}

fn required_text(value: Option<String>, field: &str) -> Result<String, BillingError> {
    let value = value.map(|s| s.trim().to_string()).unwrap_or_default();
    if value.is_empty() {
        return Err(BillingError::ValidationError(format!(
            "{} is required",
            field
        )));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_text_trims_and_rejects_blanks() {
        assert_eq!(
            required_text(Some("  flu  ".to_string()), "diagnosis").unwrap(),
            "flu"
        );
        assert!(required_text(Some("   ".to_string()), "diagnosis").is_err());
        assert!(required_text(None, "advice").is_err());
    }
}
