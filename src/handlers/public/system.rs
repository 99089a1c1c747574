use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET / - service banner
pub async fn root() -> Json<Value> {
    Json(json!({
        "success": true,
        "msg": "Movie Reviews API",
        "data": {
            "version": env!("CARGO_PKG_VERSION"),
            "endpoints": {
                "auth": "/signup, /signin (public)",
                "movies": "/movies, /movies/:movieId (token required)",
                "reviews": "/review (token required)",
            }
        }
    }))
}

/// GET /health - liveness plus a store ping
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.timed(state.store.health_check()).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "msg": "ok",
                "data": { "status": "ok", "timestamp": now, "store": "ok" }
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "msg": "store unavailable",
                    "data": { "status": "degraded", "timestamp": now }
                })),
            )
        }
    }
}
