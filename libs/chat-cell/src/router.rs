// libs/chat-cell/src/router.rs
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use shared_config::AppConfig;

use crate::handlers::{chat, patient_summary, ping, suggest_slots, validate_appointment};

pub fn bot_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/ping", get(ping))
        .route("/chat", post(chat))
        .route("/suggest_slots", post(suggest_slots))
        .route("/patient_summary", get(patient_summary))
        .route("/validate_appointment", post(validate_appointment))
        .with_state(state)
}
