// libs/patient-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::envelope::success_data;
use shared_models::error::AppError;

use crate::models::PatientQueryParams;
use crate::services::directory::PatientDirectoryService;

#[axum::debug_handler]
pub async fn list_patients(
    State(state): State<Arc<AppConfig>>,
    Query(params): Query<PatientQueryParams>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let directory = PatientDirectoryService::new(&state);

    let rows = directory.search(params.q.as_deref()).await?;

    let data: Vec<Value> = rows
        .iter()
        .map(|row| {
            json!({
                "id": row.patient.patient_id,
                "name": row.patient.full_name(),
                "hn": row.patient.hn(),
                "age": row.patient.age(),
                "tel": row.patient.phone,
                "lastVisit": row
                    .last_visit()
                    .map(|d| d.to_string())
                    .unwrap_or_default(),
            })
        })
        .collect();

    Ok((StatusCode::OK, Json(success_data(json!(data)))))
}

#[axum::debug_handler]
pub async fn patient_records(
    State(state): State<Arc<AppConfig>>,
    Path(patient_id): Path<i64>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let directory = PatientDirectoryService::new(&state);

    let records = directory.records(patient_id).await?;

    let data: Vec<Value> = records
        .iter()
        .map(|record| {
            json!({
                "id": record.treatment_id,
                "date": record.treatment_date,
                "diagnosis": record.diagnosis,
                "treatment": record.advice,
                "doctor": record.doctor_full_name(),
            })
        })
        .collect();

    Ok((StatusCode::OK, Json(success_data(json!(data)))))
}
