//! Agent module - the tool-using agent loop.
//!
//! The agent follows a "tools in a loop" pattern:
//! 1. Seed the conversation with the user prompt
//! 2. Call the LLM with the available tools
//! 3. If the LLM requests tool calls, execute them and feed the results back
//! 4. Repeat until the LLM answers without tool calls or the iteration cap is hit

mod agent_loop;
mod error;

pub use agent_loop::{Agent, AgentOutcome, AgentStep};
pub use error::AgentError;
