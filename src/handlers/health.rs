use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::models::{ErrorResponse, HealthResponse};
use crate::AppState;

/// Service banner
pub async fn root() -> Json<Value> {
    Json(json!({ "message": "Event Planning Map API", "status": "active" }))
}

/// Health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    debug!("Health check requested");
    Json(HealthResponse {
        status: "ok".to_string(),
        message: "Server is running".to_string(),
    })
}

/// Readiness: the persistence backend answers a room listing
pub async fn ready_check(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, (StatusCode, Json<ErrorResponse>)> {
    match state.engine.list_rooms().await {
        Ok(rooms) => {
            debug!("Readiness check passed, {} active rooms", rooms.len());
            Ok(Json(HealthResponse {
                status: "ok".to_string(),
                message: format!("Service is ready, {} active rooms", rooms.len()),
            }))
        }
        Err(e) => {
            warn!("Readiness check failed: {}", e);
            Err(ErrorResponse::new(
                StatusCode::SERVICE_UNAVAILABLE,
                format!("Storage unavailable: {}", e),
            ))
        }
    }
}
