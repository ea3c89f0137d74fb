// libs/billing-cell/src/router.rs
use axum::{
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;

use shared_config::AppConfig;

use crate::handlers::{create_treatment, list_unpaid_payments, pay_payment};

pub fn treatment_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", post(create_treatment))
        .with_state(state)
}

pub fn payment_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/unpaid", get(list_unpaid_payments))
        .route("/{payment_id}/pay", put(pay_payment))
        .with_state(state)
}
