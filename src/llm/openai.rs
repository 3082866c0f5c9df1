//! OpenAI-compatible chat completions client.

use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{ChatMessage, ChatResponse, LlmClient, TokenUsage, ToolCall, ToolSchema};

/// Client for any endpoint speaking the OpenAI `/chat/completions` format.
pub struct OpenAiCompatClient {
    client: reqwest::Client,
    completions_url: String,
    api_key: Option<String>,
}

impl OpenAiCompatClient {
    pub fn new(base_url: &str, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            completions_url: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            api_key,
        }
    }
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<&'a [ToolSchema]>,
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<TokenUsage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<ToolCall>>,
}

#[async_trait]
impl LlmClient for OpenAiCompatClient {
    async fn chat_completion(
        &self,
        model: &str,
        messages: &[ChatMessage],
        tools: Option<&[ToolSchema]>,
    ) -> anyhow::Result<ChatResponse> {
        // An empty tools array is rejected by some endpoints.
        let tools = tools.filter(|t| !t.is_empty());
        let body = CompletionRequest {
            model,
            messages,
            tools,
        };

        let mut request = self.client.post(&self.completions_url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("Failed to reach {}", self.completions_url))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("Model endpoint returned {}: {}", status, text);
        }

        let parsed: CompletionResponse = response
            .json()
            .await
            .context("Invalid chat completion response")?;

        parse_completion(parsed)
    }
}

fn parse_completion(parsed: CompletionResponse) -> anyhow::Result<ChatResponse> {
    let choice = parsed
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| anyhow::anyhow!("Chat completion returned no choices"))?;

    Ok(ChatResponse {
        content: choice.message.content,
        tool_calls: choice.message.tool_calls,
        usage: parsed.usage,
    })
}
