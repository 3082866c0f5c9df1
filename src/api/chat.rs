use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use uuid::Uuid;

use super::error::ApiError;
use super::routes::AppState;
use super::types::{ChatRequest, ChatResponse};

/// POST /api/chat - Run a prompt through the agent.
pub async fn chat(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        tracing::warn!("Rejected chat request: {}", rejection.body_text());
        ApiError::from(rejection)
    })?;

    if !state.agent.is_ready().await {
        return Err(ApiError::NotReady);
    }

    let request_id = Uuid::new_v4();
    tracing::info!(%request_id, "Chat request ({} chars)", request.prompt.len());

    let outcome = state.agent.execute(&request.prompt).await.map_err(|e| {
        tracing::error!(%request_id, "Chat request failed: {}", e);
        ApiError::from(e)
    })?;

    tracing::info!(
        %request_id,
        "Chat request completed with {} tool turns",
        outcome.tool_calls_made
    );

    Ok(Json(ChatResponse {
        response: outcome.response,
        tool_calls_made: outcome.tool_calls_made,
    }))
}
