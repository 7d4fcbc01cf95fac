//! Service health endpoint
//!
//! Reports the backend version and whether the production store is
//! reachable; used by deploy checks before traffic is routed.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
    pub database: String,
}

/// Report service health and store reachability
pub async fn health_check(State(state): State<AppState>) -> Json<HealthStatus> {
    let database = match sqlx::query("SELECT 1").execute(&state.db).await {
        Ok(_) => "reachable".to_string(),
        Err(_) => "unreachable".to_string(),
    };

    Json(HealthStatus {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database,
    })
}
