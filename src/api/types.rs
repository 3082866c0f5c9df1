//! API request and response types.

use serde::{Deserialize, Serialize};

/// Request to the chat endpoint.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChatRequest {
    /// User prompt to send to the agent
    pub prompt: String,
}

/// Response from the chat endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Agent response
    pub response: String,

    /// Number of agent turns that called tools
    pub tool_calls_made: usize,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Toolbox catalog URL
    pub mcp_server: String,

    /// Whether the agent is initialized
    pub agent_ready: bool,
}

/// Error body, `{"detail": "..."}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
}
