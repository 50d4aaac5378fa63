use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct WakeUpResponse {
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub services: HashMap<String, String>,
}

/// Cheap endpoint hit by the frontend to wake an idle instance
#[utoipa::path(
    get,
    path = "/wake-up",
    responses(
        (status = 200, description = "Server is awake", body = WakeUpResponse)
    ),
    tag = "health"
)]
pub async fn wake_up() -> Json<WakeUpResponse> {
    Json(WakeUpResponse {
        status: "Server is awake".to_string(),
    })
}

/// Health check endpoint
///
/// Reports the API version and whether the database answers a ping.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service status", body = HealthResponse)
    ),
    tag = "health"
)]
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let mut services = HashMap::new();

    let mongodb = match &state.database {
        Some(db) => match db.ping().await {
            Ok(()) => "connected",
            Err(e) => {
                tracing::warn!(error = %e, "MongoDB ping failed");
                "disconnected"
            }
        },
        None => "in-memory",
    };
    services.insert("mongodb".to_string(), mongodb.to_string());

    let status = if mongodb == "disconnected" { "degraded" } else { "healthy" };

    Json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        services,
    })
}
