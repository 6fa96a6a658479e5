/**
 * Health Routes
 * Liveness ping and a status probe that reports on the storage backend
 */
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::state::AppState;

// Track server start time for uptime calculation
lazy_static::lazy_static! {
    static ref SERVER_START: Instant = Instant::now();
}

/// Initialize the server start time
pub fn init_start_time() {
    lazy_static::initialize(&SERVER_START);
}

/// Reported in place of the backend's own error text.
const STORAGE_UNAVAILABLE: &str = "Storage unavailable";

/// Health status enum
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Ok,
    Degraded,
    Healthy,
    Unhealthy,
}

/// Storage backend check result
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageCheck {
    pub backend: String,
    pub status: HealthStatus,
    pub connected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Response for GET /api/status
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub status: HealthStatus,
    pub timestamp: DateTime<Utc>,
    pub uptime: u64,
    pub version: String,
    pub storage: StorageCheck,
}

/// Simple health response
#[derive(Debug, Serialize, Deserialize)]
pub struct SimpleHealthResponse {
    pub status: HealthStatus,
}

/// GET /health - Simple health ping
pub async fn health_ping() -> impl IntoResponse {
    Json(SimpleHealthResponse {
        status: HealthStatus::Ok,
    })
}

/// GET /api/status - backend in use and whether it answers
///
/// Always 200 so the frontend can tell the server itself is up.
pub async fn status(State(state): State<AppState>) -> impl IntoResponse {
    let backend = state.storage.backend_name().to_string();

    let storage = match state.storage.ping().await {
        Ok(duration) => StorageCheck {
            backend,
            status: HealthStatus::Healthy,
            connected: true,
            response_time: Some(duration.as_millis() as u64),
            error: None,
        },
        Err(e) => {
            tracing::warn!(backend = %backend, error = %e, "Storage ping failed");
            StorageCheck {
                backend,
                status: HealthStatus::Unhealthy,
                connected: false,
                response_time: None,
                error: Some(STORAGE_UNAVAILABLE.to_string()),
            }
        }
    };

    let response = StatusResponse {
        status: if storage.connected {
            HealthStatus::Ok
        } else {
            HealthStatus::Degraded
        },
        timestamp: Utc::now(),
        uptime: SERVER_START.elapsed().as_secs(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        storage,
    };

    (StatusCode::OK, Json(response))
}
