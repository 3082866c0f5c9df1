//! # toolbox-chat
//!
//! A chat backend for a tool-using LLM agent.
//!
//! This library provides:
//! - An HTTP API with a chat endpoint and a health check
//! - A tool-based agent loop over an OpenAI-compatible model endpoint
//! - A client for a remote toolbox catalog whose tools the agent can call
//!
//! ## Architecture
//!
//! The agent follows the "tools in a loop" pattern:
//! 1. Receive a prompt via the API
//! 2. Call the LLM with the tools loaded from the toolbox at startup
//! 3. Execute any tool calls through the toolbox and feed results back
//! 4. Repeat until the LLM answers without tool calls
//!
//! ## Example
//!
//! ```rust,ignore
//! use toolbox_chat::{api::AppState, config::Config};
//!
//! let state = AppState::from_config(Config::from_env()?);
//! state.startup().await?;
//! let outcome = state.agent.execute("Which datasets are available?").await?;
//! ```

pub mod agent;
pub mod api;
pub mod config;
pub mod llm;
pub mod services;
pub mod tools;

pub use config::Config;
