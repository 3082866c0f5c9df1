use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Agent not initialized. Call create() first.")]
    NotInitialized,

    #[error("No response from agent")]
    EmptyResult,

    #[error("Max iterations ({0}) reached without a final answer")]
    IterationLimitExceeded(usize),

    /// Model or tool invocation failed.
    #[error("{0:#}")]
    Upstream(anyhow::Error),
}

impl From<anyhow::Error> for AgentError {
    fn from(err: anyhow::Error) -> Self {
        Self::Upstream(err)
    }
}
