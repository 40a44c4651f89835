use axum::Json;
use serde_json::json;

/// Liveness probe; always excluded from authentication.
pub async fn health_check() -> Json<serde_json::Value> {
    Json(json!({ "status": "healthy", "service": "flightdeck-server" }))
}
