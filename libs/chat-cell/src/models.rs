// libs/chat-cell/src/models.rs
use serde::Deserialize;

use shared_models::error::AppError;

#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    pub message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SuggestSlotsRequest {
    pub doctor_id: Option<i64>,
    pub date: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PatientSummaryParams {
    pub patient_id: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ValidateAppointmentRequest {
    pub patient_id: Option<i64>,
    pub doctor_id: Option<i64>,
    pub appointment_date: Option<String>,
    pub appointment_time: Option<String>,
}

/// What the bot says back over the {ok, reply} envelope.
#[derive(Debug, Clone)]
pub struct ChatReply {
    pub ok: bool,
    pub reply: String,
}

impl ChatReply {
    pub fn understood(reply: impl Into<String>) -> Self {
        Self {
            ok: true,
            reply: reply.into(),
        }
    }

    pub fn guidance(reply: impl Into<String>) -> Self {
        Self {
            ok: false,
            reply: reply.into(),
        }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum ChatError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<ChatError> for AppError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::ValidationError(msg) => AppError::Validation(msg),
            ChatError::DatabaseError(msg) => AppError::Database(msg),
        }
    }
}
