// libs/chat-cell/src/handlers.rs
//
// Bot endpoints speak their own envelope: {ok, reply?} for chat and
// {ok, errors?} for the structured helpers, mirroring what the chat widget
// expects. Store failures still surface through the shared error type.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
};
use chrono::NaiveDate;
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::error::AppError;
use shared_models::extract::Json;

use crate::models::{
    ChatRequest, PatientSummaryParams, SuggestSlotsRequest, ValidateAppointmentRequest,
};
use crate::services::bot::BotService;

#[axum::debug_handler]
pub async fn ping() -> (StatusCode, Json<Value>) {
    (
        StatusCode::OK,
        Json(json!({ "ok": true, "message": "bot is alive" })),
    )
}

#[axum::debug_handler]
pub async fn chat(
    State(state): State<Arc<AppConfig>>,
    Json(request): Json<ChatRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let message = request.message.unwrap_or_default();
    let message = message.trim();
    if message.is_empty() {
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(json!({ "ok": false, "reply": "พิมพ์ข้อความมาก่อนนะครับ" })),
        ));
    }

    let bot = BotService::new(&state);
    let reply = bot.chat(message).await?;

    Ok((
        StatusCode::OK,
        Json(json!({ "ok": reply.ok, "reply": reply.reply })),
    ))
}

#[axum::debug_handler]
pub async fn suggest_slots(
    State(state): State<Arc<AppConfig>>,
    Json(request): Json<SuggestSlotsRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let (Some(doctor_id), Some(raw_date)) = (request.doctor_id, request.date.as_deref()) else {
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(json!({ "ok": false, "errors": ["กรุณาเลือกแพทย์และวันที่"] })),
        ));
    };
    let Ok(date) = NaiveDate::parse_from_str(raw_date, "%Y-%m-%d") else {
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(json!({ "ok": false, "errors": ["รูปแบบวันที่ไม่ถูกต้อง (YYYY-MM-DD)"] })),
        ));
    };

    let bot = BotService::new(&state);
    let slots = bot.free_slots(doctor_id, date).await?;

    Ok((
        StatusCode::OK,
        Json(json!({
            "ok": true,
            "doctor_id": doctor_id,
            "date": date,
            "available_slots": slots,
        })),
    ))
}

#[axum::debug_handler]
pub async fn patient_summary(
    State(state): State<Arc<AppConfig>>,
    Query(params): Query<PatientSummaryParams>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let Some(patient_id) = params.patient_id else {
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(json!({ "ok": false, "errors": ["กรุณาระบุรหัสผู้ป่วย"] })),
        ));
    };

    let bot = BotService::new(&state);
    match bot.patient_summary(patient_id).await {
        Ok(summary) => Ok((
            StatusCode::OK,
            Json(json!({
                "ok": true,
                "patient": summary.patient,
                "recent_treatments": summary.recent_treatments,
            })),
        )),
        Err(crate::models::ChatError::ValidationError(_)) => Ok((
            StatusCode::NOT_FOUND,
            Json(json!({ "ok": false, "errors": ["ไม่พบข้อมูลผู้ป่วย"] })),
        )),
        Err(e) => Err(e.into()),
    }
}

#[axum::debug_handler]
pub async fn validate_appointment(
    State(state): State<Arc<AppConfig>>,
    Json(request): Json<ValidateAppointmentRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let bot = BotService::new(&state);
    let errors = bot.validate_appointment(&request).await?;

    if errors.is_empty() {
        Ok((
            StatusCode::OK,
            Json(json!({
                "ok": true,
                "message": "ข้อมูลการนัดหมายผ่านการตรวจสอบ สามารถบันทึกได้",
            })),
        ))
    } else {
        Ok((
            StatusCode::BAD_REQUEST,
            Json(json!({ "ok": false, "errors": errors })),
        ))
    }
}
