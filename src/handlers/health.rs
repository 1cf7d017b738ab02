use crate::{db, errors::ApiError, AppState};
use axum::{extract::State, response::IntoResponse, Json};
use serde_json::json;

/// Liveness check including a database ping.
pub async fn health_check(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    db::check_connection(&state.db)
        .await
        .map_err(ApiError::ServiceError)?;

    Ok(Json(json!({
        "status": "ok",
        "database": "connected",
    })))
}
