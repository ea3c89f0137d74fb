// libs/auth-cell/src/router.rs
use axum::{routing::post, Router};
use std::sync::Arc;

use shared_config::AppConfig;

use crate::handlers::login;

pub fn auth_routes(state: Arc<AppConfig>) -> Router {
    Router::new().route("/login", post(login)).with_state(state)
}
