// libs/appointment-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::envelope::{success, success_data};
use shared_models::error::AppError;
use shared_models::extract::Json;

use crate::models::{AppointmentQueryParams, CreateAppointmentRequest, UpdateAppointmentRequest};
use crate::services::booking::AppointmentBookingService;

#[axum::debug_handler]
pub async fn create_appointment(
    State(state): State<Arc<AppConfig>>,
    Json(request): Json<CreateAppointmentRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let booking = AppointmentBookingService::new(&state);

    let appointment = booking.create(request).await?;

    Ok((
        StatusCode::CREATED,
        Json(success("Appointment created", json!(appointment))),
    ))
}

#[axum::debug_handler]
pub async fn list_appointments(
    State(state): State<Arc<AppConfig>>,
    Query(params): Query<AppointmentQueryParams>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let booking = AppointmentBookingService::new(&state);

    let rows = booking.list(&params).await?;

    let data: Vec<Value> = rows
        .iter()
        .map(|row| {
            json!({
                "id": row.appointment_id,
                "date": row.appointment_date,
                "time": row.appointment_time.format("%H:%M").to_string(),
                "status": row.status,
                "patient_id": row.patient.patient_id,
                "patient_name": row.patient_full_name(),
                "doctor_id": row.doctor.doctor_id,
                "doctor_name": row.doctor_full_name(),
            })
        })
        .collect();

    Ok((StatusCode::OK, Json(success_data(json!(data)))))
}

#[axum::debug_handler]
pub async fn update_appointment(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<i64>,
    Json(request): Json<UpdateAppointmentRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let booking = AppointmentBookingService::new(&state);

    let appointment = booking.update(appointment_id, request).await?;

    Ok((
        StatusCode::OK,
        Json(success("Appointment updated", json!(appointment))),
    ))
}

#[axum::debug_handler]
pub async fn cancel_appointment(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<i64>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let booking = AppointmentBookingService::new(&state);

    let appointment = booking.cancel(appointment_id).await?;

    Ok((
        StatusCode::OK,
        Json(success("Appointment cancelled", json!(appointment))),
    ))
}

#[axum::debug_handler]
pub async fn mark_no_show(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<i64>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let booking = AppointmentBookingService::new(&state);

    let appointment = booking.mark_no_show(appointment_id).await?;

    Ok((
        StatusCode::OK,
        Json(success("Appointment marked as no-show", json!(appointment))),
    ))
}
