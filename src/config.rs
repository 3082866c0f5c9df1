//! Configuration management for toolbox-chat.
//!
//! Configuration can be set via environment variables:
//! - `LLM_MODEL` - Optional. Model identifier in `provider:model` form.
//!   Defaults to `google_genai:gemini-2.0-flash`.
//! - `LLM_BASE_URL` - Optional. OpenAI-compatible endpoint. Defaults to the provider's endpoint.
//! - `LLM_API_KEY` - Optional. Overrides the provider key
//!   (`GOOGLE_API_KEY`, `OPENAI_API_KEY`, `OPENROUTER_API_KEY`).
//! - `MCP_SERVER_URL` - Optional. Toolbox catalog base URL. Defaults to `http://127.0.0.1:5000`.
//! - `HOST` - Optional. Server host. Defaults to `0.0.0.0`.
//! - `PORT` - Optional. Server port. Defaults to `8000`.
//! - `MAX_ITERATIONS` - Optional. Maximum model calls per chat request. Defaults to `25`.
//! - `CORS_ORIGINS` / `CORS_ALLOW_METHODS` / `CORS_ALLOW_HEADERS` - Optional.
//!   Comma separated, default `*`.
//! - `CORS_ALLOW_CREDENTIALS` - Optional. Defaults to `true`.
//! - `API_TITLE` / `API_DESCRIPTION` / `API_VERSION` - Optional. Reported in startup logs.

use thiserror::Error;
use url::Url;

use crate::llm::ModelSpec;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Language model configuration.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Parsed model identifier
    pub model: ModelSpec,

    /// OpenAI-compatible base URL (without `/chat/completions`)
    pub base_url: String,

    /// Bearer token, if the endpoint needs one
    pub api_key: Option<String>,
}

/// Cross-origin policy applied to every route.
#[derive(Debug, Clone)]
pub struct CorsConfig {
    pub origins: Vec<String>,
    pub allow_methods: Vec<String>,
    pub allow_headers: Vec<String>,
    pub allow_credentials: bool,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            origins: vec!["*".to_string()],
            allow_methods: vec!["*".to_string()],
            allow_headers: vec!["*".to_string()],
            allow_credentials: true,
        }
    }
}

const DEFAULT_API_TITLE: &str = "BigQuery MCP Agent Backend";
const DEFAULT_API_DESCRIPTION: &str = "Chat backend integrated with a BigQuery toolbox server";

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Model client configuration
    pub llm: LlmConfig,

    /// Toolbox catalog base URL
    pub mcp_server_url: String,

    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Maximum model calls per chat request
    pub max_iterations: usize,

    /// CORS policy
    pub cors: CorsConfig,

    pub api_title: String,
    pub api_description: String,
    pub api_version: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` if the selected provider needs an
    /// API key and none is set, and `ConfigError::InvalidValue` for values
    /// that do not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let model_id = std::env::var("LLM_MODEL")
            .unwrap_or_else(|_| "google_genai:gemini-2.0-flash".to_string());
        let model = ModelSpec::parse(&model_id)
            .map_err(|e| ConfigError::InvalidValue("LLM_MODEL".to_string(), e))?;

        let base_url = match std::env::var("LLM_BASE_URL") {
            Ok(url) => validate_url("LLM_BASE_URL", &url)?,
            Err(_) => model
                .provider
                .default_base_url()
                .map(str::to_string)
                .ok_or_else(|| ConfigError::MissingEnvVar("LLM_BASE_URL".to_string()))?,
        };

        let api_key = match std::env::var("LLM_API_KEY") {
            Ok(key) => Some(key),
            Err(_) => match model.provider.api_key_env() {
                Some(var) => Some(
                    std::env::var(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))?,
                ),
                None => None,
            },
        };

        let mcp_server_url = std::env::var("MCP_SERVER_URL")
            .unwrap_or_else(|_| "http://127.0.0.1:5000".to_string());
        let mcp_server_url = validate_url("MCP_SERVER_URL", &mcp_server_url)?;

        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());

        let port = std::env::var("PORT")
            .unwrap_or_else(|_| "8000".to_string())
            .parse()
            .map_err(|e| ConfigError::InvalidValue("PORT".to_string(), format!("{}", e)))?;

        let max_iterations: usize = std::env::var("MAX_ITERATIONS")
            .unwrap_or_else(|_| "25".to_string())
            .parse()
            .map_err(|e| {
                ConfigError::InvalidValue("MAX_ITERATIONS".to_string(), format!("{}", e))
            })?;
        if max_iterations == 0 {
            return Err(ConfigError::InvalidValue(
                "MAX_ITERATIONS".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        let defaults = CorsConfig::default();
        let cors = CorsConfig {
            origins: env_list("CORS_ORIGINS").unwrap_or(defaults.origins),
            allow_methods: env_list("CORS_ALLOW_METHODS").unwrap_or(defaults.allow_methods),
            allow_headers: env_list("CORS_ALLOW_HEADERS").unwrap_or(defaults.allow_headers),
            allow_credentials: std::env::var("CORS_ALLOW_CREDENTIALS")
                .ok()
                .map(|v| {
                    parse_bool(&v).map_err(|e| {
                        ConfigError::InvalidValue("CORS_ALLOW_CREDENTIALS".to_string(), e)
                    })
                })
                .transpose()?
                .unwrap_or(defaults.allow_credentials),
        };

        Ok(Self {
            llm: LlmConfig {
                model,
                base_url,
                api_key,
            },
            mcp_server_url,
            host,
            port,
            max_iterations,
            cors,
            api_title: std::env::var("API_TITLE")
                .unwrap_or_else(|_| DEFAULT_API_TITLE.to_string()),
            api_description: std::env::var("API_DESCRIPTION")
                .unwrap_or_else(|_| DEFAULT_API_DESCRIPTION.to_string()),
            api_version: std::env::var("API_VERSION")
                .unwrap_or_else(|_| env!("CARGO_PKG_VERSION").to_string()),
        })
    }

    /// Create a config with custom values (useful for testing).
    pub fn new(model: ModelSpec, base_url: String, mcp_server_url: String) -> Self {
        Self {
            llm: LlmConfig {
                model,
                base_url,
                api_key: None,
            },
            mcp_server_url,
            host: "127.0.0.1".to_string(),
            port: 8000,
            max_iterations: 25,
            cors: CorsConfig::default(),
            api_title: DEFAULT_API_TITLE.to_string(),
            api_description: DEFAULT_API_DESCRIPTION.to_string(),
            api_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

fn validate_url(var: &str, value: &str) -> Result<String, ConfigError> {
    Url::parse(value).map_err(|e| ConfigError::InvalidValue(var.to_string(), format!("{}", e)))?;
    Ok(value.trim_end_matches('/').to_string())
}

fn env_list(var: &str) -> Option<Vec<String>> {
    std::env::var(var).ok().map(|v| parse_list(&v))
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_bool(value: &str) -> Result<bool, String> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "t" | "yes" | "y" | "on" => Ok(true),
        "0" | "false" | "f" | "no" | "n" | "off" => Ok(false),
        other => Err(format!("expected boolean-like value, got: {}", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Environment is process-wide; tests that touch it take this lock.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const VARS: &[&str] = &[
        "LLM_MODEL",
        "LLM_BASE_URL",
        "LLM_API_KEY",
        "GOOGLE_API_KEY",
        "OPENAI_API_KEY",
        "OPENROUTER_API_KEY",
        "MCP_SERVER_URL",
        "HOST",
        "PORT",
        "MAX_ITERATIONS",
        "CORS_ORIGINS",
        "CORS_ALLOW_METHODS",
        "CORS_ALLOW_HEADERS",
        "CORS_ALLOW_CREDENTIALS",
        "API_TITLE",
        "API_DESCRIPTION",
        "API_VERSION",
    ];

    fn load_with(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        for var in VARS {
            std::env::remove_var(var);
        }
        for (var, value) in vars {
            std::env::set_var(var, value);
        }
        let result = Config::from_env();
        for (var, _) in vars {
            std::env::remove_var(var);
        }
        result
    }

    fn invalid_var(result: Result<Config, ConfigError>) -> String {
        match result {
            Err(ConfigError::InvalidValue(var, _)) => var,
            other => panic!("expected InvalidValue, got {:?}", other),
        }
    }

    #[test]
    fn from_env_applies_defaults() {
        let config = load_with(&[("GOOGLE_API_KEY", "g-key")]).unwrap();

        assert_eq!(config.llm.model.provider, crate::llm::Provider::GoogleGenAi);
        assert_eq!(config.llm.model.model, "gemini-2.0-flash");
        assert_eq!(
            config.llm.base_url,
            "https://generativelanguage.googleapis.com/v1beta/openai"
        );
        assert_eq!(config.llm.api_key.as_deref(), Some("g-key"));
        assert_eq!(config.mcp_server_url, "http://127.0.0.1:5000");
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8000);
        assert_eq!(config.max_iterations, 25);
        assert_eq!(config.cors.origins, vec!["*"]);
        assert!(config.cors.allow_credentials);
        assert_eq!(config.api_title, DEFAULT_API_TITLE);
        assert_eq!(config.api_description, DEFAULT_API_DESCRIPTION);
    }

    #[test]
    fn from_env_reads_overrides() {
        let config = load_with(&[
            ("LLM_MODEL", "custom:qwen2.5"),
            ("LLM_BASE_URL", "http://localhost:11434/v1/"),
            ("MCP_SERVER_URL", "http://toolbox:5000"),
            ("PORT", "9000"),
            ("MAX_ITERATIONS", "4"),
            ("CORS_ORIGINS", "http://a.test, http://b.test"),
            ("CORS_ALLOW_CREDENTIALS", "no"),
        ])
        .unwrap();

        assert_eq!(config.llm.base_url, "http://localhost:11434/v1");
        assert_eq!(config.llm.api_key, None);
        assert_eq!(config.mcp_server_url, "http://toolbox:5000");
        assert_eq!(config.port, 9000);
        assert_eq!(config.max_iterations, 4);
        assert_eq!(config.cors.origins, vec!["http://a.test", "http://b.test"]);
        assert!(!config.cors.allow_credentials);
    }

    #[test]
    fn from_env_rejects_invalid_values() {
        let key = ("GOOGLE_API_KEY", "g-key");
        assert_eq!(invalid_var(load_with(&[key, ("PORT", "eighty")])), "PORT");
        assert_eq!(invalid_var(load_with(&[key, ("LLM_MODEL", "llama3")])), "LLM_MODEL");
        assert_eq!(
            invalid_var(load_with(&[key, ("CORS_ALLOW_CREDENTIALS", "maybe")])),
            "CORS_ALLOW_CREDENTIALS"
        );
        assert_eq!(
            invalid_var(load_with(&[key, ("MCP_SERVER_URL", "not a url")])),
            "MCP_SERVER_URL"
        );
    }

    #[test]
    fn from_env_rejects_zero_iterations() {
        let result = load_with(&[("GOOGLE_API_KEY", "g-key"), ("MAX_ITERATIONS", "0")]);
        assert_eq!(invalid_var(result), "MAX_ITERATIONS");
    }

    #[test]
    fn from_env_requires_provider_key() {
        match load_with(&[]) {
            Err(ConfigError::MissingEnvVar(var)) => assert_eq!(var, "GOOGLE_API_KEY"),
            other => panic!("expected MissingEnvVar, got {:?}", other),
        }
    }

    #[test]
    fn custom_provider_requires_base_url() {
        match load_with(&[("LLM_MODEL", "custom:qwen2.5")]) {
            Err(ConfigError::MissingEnvVar(var)) => assert_eq!(var, "LLM_BASE_URL"),
            other => panic!("expected MissingEnvVar, got {:?}", other),
        }
    }

    #[test]
    fn parse_list_trims_and_drops_empty_entries() {
        assert_eq!(
            parse_list(" http://a.test , ,http://b.test"),
            vec!["http://a.test".to_string(), "http://b.test".to_string()]
        );
        assert!(parse_list("").is_empty());
    }

    #[test]
    fn parse_bool_accepts_common_spellings() {
        assert_eq!(parse_bool("Yes"), Ok(true));
        assert_eq!(parse_bool(" off "), Ok(false));
        assert!(parse_bool("maybe").is_err());
    }

    #[test]
    fn validate_url_strips_trailing_slash() {
        assert_eq!(
            validate_url("MCP_SERVER_URL", "http://127.0.0.1:5000/").unwrap(),
            "http://127.0.0.1:5000"
        );
        assert!(validate_url("MCP_SERVER_URL", "not a url").is_err());
    }

    #[test]
    fn default_cors_allows_everything_with_credentials() {
        let cors = CorsConfig::default();
        assert_eq!(cors.origins, vec!["*"]);
        assert!(cors.allow_credentials);
    }
}
