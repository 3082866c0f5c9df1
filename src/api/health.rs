use std::sync::Arc;

use axum::{extract::State, Json};

use super::routes::AppState;
use super::types::HealthResponse;

/// GET /health - Service status and agent readiness. Never fails.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        mcp_server: state.catalog.base_url().to_string(),
        agent_ready: state.agent.is_ready().await,
    })
}
