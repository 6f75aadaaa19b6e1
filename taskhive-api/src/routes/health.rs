/// Health check endpoints
///
/// `GET /` is a bare liveness probe; `GET /health` also verifies
/// database connectivity.
use axum::extract::State;
use serde::{Deserialize, Serialize};

use crate::app::AppState;
use crate::response::{self, DataEnvelope};
use crate::routes::Json;

/// Health check payload
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthStatus {
    /// Service status
    pub status: String,

    /// Application version
    pub version: String,

    /// Database status
    pub database: String,
}

/// Liveness handler
///
/// ```text
/// GET /
/// ```
///
/// Response:
/// ```json
/// { "success": true, "data": "Server is running" }
/// ```
pub async fn root() -> Json<DataEnvelope<&'static str>> {
    response::ok("Server is running")
}

/// Health check handler
///
/// Returns service health including database connectivity.
///
/// ```text
/// GET /health
/// ```
///
/// Response:
/// ```json
/// {
///   "success": true,
///   "data": { "status": "healthy", "version": "0.1.0", "database": "connected" }
/// }
/// ```
pub async fn health_check(State(state): State<AppState>) -> Json<DataEnvelope<HealthStatus>> {
    let database = match sqlx::query("SELECT 1").fetch_one(&state.db).await {
        Ok(_) => "connected",
        Err(_) => "disconnected",
    };

    response::ok(HealthStatus {
        status: if database == "connected" {
            "healthy".to_string()
        } else {
            "degraded".to_string()
        },
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: database.to_string(),
    })
}
