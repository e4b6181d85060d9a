use crate::schemas::{ErrorResponse, AppState, HealthResponse};
use axum::{extract::State, http::StatusCode, response::Json};
use tracing::{instrument, warn};

/// Health check endpoint
///
/// Reports the crate version and whether the database answers a ping. A
/// failed ping degrades the status but still returns 200 so the process
/// itself reads as alive.
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 500, description = "Service is unhealthy", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn health_check(State(state): State<AppState>) -> Result<Json<HealthResponse>, StatusCode> {
    // A ping is a real round-trip, so "connected" means queries will work.
    let (status, database) = match state.db.ping().await {
        Ok(_) => ("healthy", "connected"),
        Err(ping_error) => {
            warn!("Database ping failed: {}", ping_error);
            ("degraded", "disconnected")
        }
    };

    let response = HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: database.to_string(),
    };

    Ok(Json(response))
}
