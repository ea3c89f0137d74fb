// libs/patient-cell/src/router.rs
use axum::{routing::get, Router};
use std::sync::Arc;

use shared_config::AppConfig;

use crate::handlers::{list_patients, patient_records};

pub fn patient_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(list_patients))
        .route("/{patient_id}/records", get(patient_records))
        .with_state(state)
}
