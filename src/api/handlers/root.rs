use axum::{http::StatusCode, Json, response::IntoResponse};
use serde_json::json;

pub async fn root() -> impl IntoResponse {
    Json(json!({
        "name": "Campus Feed API",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Announcement and notification feed for the academic portal",
        "status": "operational",
        "endpoints": {
            "health": "/health",
            "feed": "/api/feed"
        }
    }))
}

pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339()
    })))
}
