//! HTTP API.
//!
//! ## Endpoints
//!
//! - `GET /health` - Service status and agent readiness
//! - `POST /api/chat` - Run a prompt through the agent

mod chat;
mod cors;
mod error;
mod health;
mod routes;
pub mod types;

pub use error::ApiError;
pub use routes::{router, serve, AppState};
