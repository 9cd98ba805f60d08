//! # General Route Handlers
//!
//! Service banner and health check.

use super::AppState;
use axum::{extract::State, Json};
use serde_json::{json, Value};

/// The handler for the root (`/`) endpoint.
pub async fn root() -> Json<Value> {
    Json(json!({
        "service": "leadrag assistant",
        "status": "operational",
    }))
}

/// The handler for the health check (`/health`) endpoint.
pub async fn health_check(State(app_state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "model": app_state.config.completion.model_name,
    }))
}
