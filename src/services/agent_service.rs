//! Holder for the process-wide agent.

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::agent::{Agent, AgentError, AgentOutcome};
use crate::llm::LlmClient;
use crate::tools::Tool;

/// Creates the agent once tools are available and runs prompts through it.
pub struct AgentService {
    llm: Arc<dyn LlmClient>,
    model: String,
    max_iterations: usize,
    agent: RwLock<Option<Arc<Agent>>>,
}

impl AgentService {
    pub fn new(llm: Arc<dyn LlmClient>, model: impl Into<String>, max_iterations: usize) -> Self {
        Self {
            llm,
            model: model.into(),
            max_iterations,
            agent: RwLock::new(None),
        }
    }

    /// Compile the agent for `tools`. Replaces any previous agent.
    pub async fn create(&self, tools: Vec<Arc<dyn Tool>>) {
        let agent = Agent::create(self.llm.clone(), self.model.clone(), tools, self.max_iterations);
        tracing::info!(
            "Agent ready: model={} tools={}",
            self.model,
            agent.tools().len()
        );
        *self.agent.write().await = Some(Arc::new(agent));
    }

    pub async fn is_ready(&self) -> bool {
        self.agent.read().await.is_some()
    }

    /// Run `prompt` through the agent.
    pub async fn execute(&self, prompt: &str) -> Result<AgentOutcome, AgentError> {
        // Release the lock before the (long) agent run.
        let agent = self
            .agent
            .read()
            .await
            .clone()
            .ok_or(AgentError::NotInitialized)?;
        agent.execute(prompt).await
    }
}
