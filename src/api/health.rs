use axum::{extract::State, http::StatusCode, response::Json};
use serde_json::{json, Value};

use super::state::AppState;

pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let (status, label) = match state.storage.ping().await {
        Ok(()) => (StatusCode::OK, "healthy"),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            (StatusCode::SERVICE_UNAVAILABLE, "unhealthy")
        }
    };

    (
        status,
        Json(json!({
            "status": label,
            "service": "course-api",
            "version": env!("CARGO_PKG_VERSION"),
            "storage": state.storage.backend().as_str(),
            "timestamp": chrono::Utc::now().to_rfc3339()
        })),
    )
}
