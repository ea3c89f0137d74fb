// libs/billing-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
};
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::envelope::{success, success_data};
use shared_models::error::AppError;
use shared_models::extract::Json;

use crate::models::{BillingError, CreateTreatmentRequest, PayRequest};
use crate::services::settlement::PaymentSettlementService;
use crate::services::workflow::TreatmentWorkflowService;

#[axum::debug_handler]
pub async fn create_treatment(
    State(state): State<Arc<AppConfig>>,
    Json(request): Json<CreateTreatmentRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let workflow = TreatmentWorkflowService::new(&state);

    match workflow.create_treatment(request).await {
        Ok(outcome) => Ok((
            StatusCode::CREATED,
            Json(success("Treatment recorded", json!(outcome))),
        )),
        // The duplicate response carries the existing id so the front end
        // can jump straight to it.
        Err(BillingError::DuplicateTreatment { treatment_id }) => Ok((
            StatusCode::BAD_REQUEST,
            Json(json!({
                "status": "error",
                "message": "Treatment already recorded for this appointment",
                "treatment_id": treatment_id,
            })),
        )),
        Err(e) => Err(e.into()),
    }
}

#[axum::debug_handler]
pub async fn list_unpaid_payments(
    State(state): State<Arc<AppConfig>>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let settlement = PaymentSettlementService::new(&state);

    let rows = settlement.list_unpaid().await?;

    let data: Vec<Value> = rows
        .iter()
        .map(|row| {
            json!({
                "payment_id": row.payment_id,
                "amount": row.amount,
                "status": row.status,
                "appointment_id": row.appointment.appointment_id,
                "appointment_date": row.appointment.appointment_date,
                "appointment_time": row.appointment.appointment_time.format("%H:%M").to_string(),
                "patient_id": row.patient.patient_id,
                "patient_name": row.patient_full_name(),
            })
        })
        .collect();

    Ok((StatusCode::OK, Json(success_data(json!(data)))))
}

#[axum::debug_handler]
pub async fn pay_payment(
    State(state): State<Arc<AppConfig>>,
    Path(payment_id): Path<i64>,
    Json(request): Json<PayRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let settlement = PaymentSettlementService::new(&state);

    let payment = settlement.pay(payment_id, request).await?;

    Ok((
        StatusCode::OK,
        Json(success("Payment settled", json!(payment))),
    ))
}
