//! Model identifier parsing.
//!
//! Identifiers use the `provider:model` form (`google_genai:gemini-2.0-flash`).
//! A bare model name is mapped to a provider by its prefix.

/// Known OpenAI-compatible providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    GoogleGenAi,
    OpenAI,
    OpenRouter,
    /// Any other OpenAI-compatible endpoint; `LLM_BASE_URL` is required.
    Custom,
}

impl Provider {
    fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "google_genai" | "google" | "gemini" => Some(Self::GoogleGenAi),
            "openai" => Some(Self::OpenAI),
            "openrouter" => Some(Self::OpenRouter),
            "custom" => Some(Self::Custom),
            _ => None,
        }
    }

    fn infer(model: &str) -> Option<Self> {
        if model.starts_with("gemini") {
            Some(Self::GoogleGenAi)
        } else if ["gpt-", "o1", "o3"].iter().any(|p| model.starts_with(p)) {
            Some(Self::OpenAI)
        } else {
            None
        }
    }

    pub fn id(&self) -> &'static str {
        match self {
            Self::GoogleGenAi => "google_genai",
            Self::OpenAI => "openai",
            Self::OpenRouter => "openrouter",
            Self::Custom => "custom",
        }
    }

    /// Base URL of the provider's OpenAI-compatible API.
    pub fn default_base_url(&self) -> Option<&'static str> {
        match self {
            Self::GoogleGenAi => {
                Some("https://generativelanguage.googleapis.com/v1beta/openai")
            }
            Self::OpenAI => Some("https://api.openai.com/v1"),
            Self::OpenRouter => Some("https://openrouter.ai/api/v1"),
            Self::Custom => None,
        }
    }

    /// Environment variable holding the provider's API key.
    pub fn api_key_env(&self) -> Option<&'static str> {
        match self {
            Self::GoogleGenAi => Some("GOOGLE_API_KEY"),
            Self::OpenAI => Some("OPENAI_API_KEY"),
            Self::OpenRouter => Some("OPENROUTER_API_KEY"),
            Self::Custom => None,
        }
    }
}

/// A parsed model identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSpec {
    pub provider: Provider,
    /// Model name sent to the endpoint
    pub model: String,
}

impl ModelSpec {
    pub fn parse(id: &str) -> Result<Self, String> {
        let id = id.trim();
        if id.is_empty() {
            return Err("model identifier is empty".to_string());
        }

        if let Some((prefix, model)) = id.split_once(':') {
            if let Some(provider) = Provider::from_prefix(prefix) {
                if model.is_empty() {
                    return Err(format!("missing model name after '{}:'", prefix));
                }
                return Ok(Self {
                    provider,
                    model: model.to_string(),
                });
            }
        }

        Provider::infer(id)
            .map(|provider| Self {
                provider,
                model: id.to_string(),
            })
            .ok_or_else(|| {
                format!(
                    "cannot infer provider for '{}'; use provider:model \
                     (google_genai, openai, openrouter, custom)",
                    id
                )
            })
    }
}

impl std::fmt::Display for ModelSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.provider.id(), self.model)
    }
}
