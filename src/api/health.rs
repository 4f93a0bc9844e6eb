//! Health check endpoint.

use axum::extract::State;
use serde::Serialize;

use super::{success, ApiResult};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub environment: String,
    pub version: &'static str,
}

/// GET /v1/healthcheck
pub async fn healthcheck(State(state): State<AppState>) -> ApiResult<HealthStatus> {
    state.repo.ping().await?;

    success(HealthStatus {
        status: "available",
        environment: state.config.env.clone(),
        version: env!("CARGO_PKG_VERSION"),
    })
}
