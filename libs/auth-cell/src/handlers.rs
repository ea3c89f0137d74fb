// libs/auth-cell/src/handlers.rs
use std::sync::Arc;

use axum::{extract::State, http::StatusCode};
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::error::AppError;
use shared_models::extract::Json;

use crate::models::LoginRequest;
use crate::services::login::LoginService;

#[axum::debug_handler]
pub async fn login(
    State(state): State<Arc<AppConfig>>,
    Json(request): Json<LoginRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let service = LoginService::new(&state);

    let outcome = service.login(request).await?;

    Ok((
        StatusCode::OK,
        Json(json!({
            "status": "success",
            "role": outcome.role,
            "user": outcome.user,
        })),
    ))
}
