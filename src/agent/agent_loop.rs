//! Core agent loop implementation.

use std::sync::Arc;

use anyhow::Context;
use serde_json::Value;

use crate::llm::{ChatMessage, LlmClient, ToolCall, ToolSchema};
use crate::tools::{Tool, ToolRegistry};

use super::AgentError;

/// Position of a conversation in the agent loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentStep {
    /// Conversation not yet seeded
    Start,
    /// Next: call the model
    Agent,
    /// Next: run the tool calls of the last assistant message
    Tools,
    /// The last assistant message requested no tools
    End,
}

/// Result of one `execute` call.
#[derive(Debug, Clone)]
pub struct AgentOutcome {
    /// Content of the final message
    pub response: String,

    /// Number of assistant turns that requested at least one tool
    pub tool_calls_made: usize,

    /// Full conversation, starting with the user prompt
    pub messages: Vec<ChatMessage>,
}

/// A model bound to a fixed tool set.
///
/// Immutable once created; concurrent `execute` calls share it and each build
/// their own conversation.
pub struct Agent {
    llm: Arc<dyn LlmClient>,
    model: String,
    tools: ToolRegistry,
    tool_schemas: Vec<ToolSchema>,
    max_iterations: usize,
}

impl Agent {
    /// Bind `model` to `tools`.
    pub fn create(
        llm: Arc<dyn LlmClient>,
        model: impl Into<String>,
        tools: Vec<Arc<dyn Tool>>,
        max_iterations: usize,
    ) -> Self {
        let tools = ToolRegistry::new(tools);
        let tool_schemas = tools.get_tool_schemas();

        Self {
            llm,
            model: model.into(),
            tools,
            tool_schemas,
            max_iterations,
        }
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Run one conversation to completion.
    pub async fn execute(&self, prompt: &str) -> Result<AgentOutcome, AgentError> {
        let mut messages = Vec::new();
        let mut iterations = 0;
        let mut step = AgentStep::Start;

        while step != AgentStep::End {
            step = match step {
                AgentStep::Start => {
                    messages.push(ChatMessage::user(prompt));
                    AgentStep::Agent
                }
                AgentStep::Agent => {
                    if iterations >= self.max_iterations {
                        return Err(AgentError::IterationLimitExceeded(self.max_iterations));
                    }
                    iterations += 1;
                    tracing::debug!("Agent iteration {}", iterations);

                    let message = self.call_model(&messages).await?;
                    let next = if message.requests_tools() {
                        AgentStep::Tools
                    } else {
                        AgentStep::End
                    };
                    messages.push(message);
                    next
                }
                AgentStep::Tools => {
                    let calls = messages
                        .last()
                        .map(|m| m.pending_tool_calls().to_vec())
                        .unwrap_or_default();
                    let results = self.run_tools(&calls).await?;
                    messages.extend(results);
                    AgentStep::Agent
                }
                AgentStep::End => AgentStep::End,
            };
        }

        let final_message = messages.last().ok_or(AgentError::EmptyResult)?;
        let response = match &final_message.content {
            Some(content) => content.clone(),
            None => serde_json::to_string(final_message)
                .unwrap_or_else(|_| format!("{:?}", final_message)),
        };
        let tool_calls_made = messages.iter().filter(|m| m.requests_tools()).count();

        Ok(AgentOutcome {
            response,
            tool_calls_made,
            messages,
        })
    }

    async fn call_model(&self, messages: &[ChatMessage]) -> anyhow::Result<ChatMessage> {
        let response = self
            .llm
            .chat_completion(&self.model, messages, Some(&self.tool_schemas))
            .await?;

        if let Some(usage) = &response.usage {
            tracing::debug!(
                "Model {} used {} prompt / {} completion tokens",
                self.model,
                usage.prompt_tokens,
                usage.completion_tokens
            );
        }

        Ok(response.into_message())
    }

    /// Run every call of one step concurrently; results keep call order.
    async fn run_tools(&self, calls: &[ToolCall]) -> anyhow::Result<Vec<ChatMessage>> {
        let outputs =
            futures::future::try_join_all(calls.iter().map(|call| self.execute_tool_call(call)))
                .await?;

        Ok(calls
            .iter()
            .zip(outputs)
            .map(|(call, output)| ChatMessage::tool_result(call.id.clone(), output))
            .collect())
    }

    /// Execute a single tool call.
    async fn execute_tool_call(&self, tool_call: &ToolCall) -> anyhow::Result<String> {
        let name = &tool_call.function.name;
        tracing::info!("Calling tool: {} with args: {}", name, tool_call.function.arguments);

        let Some(tool) = self.tools.get(name) else {
            let available = self
                .tools
                .list_tools()
                .into_iter()
                .map(|t| t.name)
                .collect::<Vec<_>>()
                .join(", ");
            return Ok(format!(
                "Error: {} is not a valid tool, try one of [{}].",
                name, available
            ));
        };

        let args = parse_arguments(&tool_call.function.arguments)
            .with_context(|| format!("Invalid arguments for tool '{}'", name))?;

        let result = tool.execute(args).await?;
        Ok(result_to_content(result))
    }
}

fn parse_arguments(raw: &str) -> serde_json::Result<Value> {
    if raw.trim().is_empty() {
        return Ok(Value::Object(Default::default()));
    }
    serde_json::from_str(raw)
}

fn result_to_content(result: Value) -> String {
    match result {
        Value::String(s) => s,
        other => other.to_string(),
    }
}
