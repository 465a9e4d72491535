use axum::{extract::State, response::Response};
use serde::Serialize;
use tracing::warn;

use crate::web::{responses::handle_result, AppState};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: &'static str,
    pub version: &'static str,
}

/// Liveness plus database connectivity
pub async fn health_check(State(state): State<AppState>) -> Response {
    let database = match sqlx::query("SELECT 1").execute(&state.database.pool()).await {
        Ok(_) => "connected",
        Err(e) => {
            warn!("Health check database probe failed: {}", e);
            "disconnected"
        }
    };

    handle_result(Ok(HealthResponse {
        status: if database == "connected" { "healthy" } else { "degraded" },
        database,
        version: env!("CARGO_PKG_VERSION"),
    }))
}
