use axum::{http::StatusCode, Json, response::IntoResponse};
use serde_json::json;

pub async fn root() -> impl IntoResponse {
    Json(json!({
        "name": "AssignmentPro API",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Marketplace connecting assignment makers with seekers",
        "status": "operational",
        "endpoints": {
            "health": "/health",
            "auth": "/auth/login",
            "departments": "/departments",
            "assignments": "/assignments",
            "admin": "/admin"
        }
    }))
}

pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    })))
}
