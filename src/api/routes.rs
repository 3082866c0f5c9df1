//! Router, application context and server lifecycle.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use super::{chat, cors, health};
use crate::config::Config;
use crate::llm::{LlmClient, OpenAiCompatClient};
use crate::services::{AgentService, CatalogService};

/// Shared application state, built once at startup and handed to every handler.
pub struct AppState {
    pub config: Config,
    pub catalog: CatalogService,
    pub agent: AgentService,
}

impl AppState {
    /// Build unstarted services for `config` using `llm` as the model client.
    pub fn new(config: Config, llm: Arc<dyn LlmClient>) -> Self {
        let catalog = CatalogService::new(config.mcp_server_url.clone());
        let agent = AgentService::new(llm, config.llm.model.model.clone(), config.max_iterations);
        Self {
            config,
            catalog,
            agent,
        }
    }

    pub fn from_config(config: Config) -> Self {
        let llm = Arc::new(OpenAiCompatClient::new(
            &config.llm.base_url,
            config.llm.api_key.clone(),
        ));
        Self::new(config, llm)
    }

    /// Connect the catalog and create the agent.
    ///
    /// The agent is only created after the catalog connects; on failure the
    /// catalog is left disconnected and the agent is never created.
    pub async fn startup(&self) -> anyhow::Result<()> {
        let tools = match self.catalog.connect().await {
            Ok(tools) => tools,
            Err(e) => {
                self.catalog.disconnect().await;
                return Err(e.context(format!(
                    "Failed to load tools from {}",
                    self.catalog.base_url()
                )));
            }
        };
        self.agent.create(tools).await;
        Ok(())
    }

    pub async fn shutdown(&self) {
        self.catalog.disconnect().await;
    }
}

/// Build the application router.
pub fn router(state: Arc<AppState>) -> anyhow::Result<Router> {
    let cors = cors::cors_layer(&state.config.cors)?;

    Ok(Router::new()
        .route("/health", get(health::health_check))
        .route("/api/chat", post(chat::chat))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

/// Start services, serve until a shutdown signal, then disconnect.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let state = Arc::new(AppState::from_config(config));

    state.startup().await?;
    let app = router(state.clone())?;

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(
        "{} {} listening on {}",
        state.config.api_title,
        state.config.api_version,
        addr
    );
    tracing::debug!("{}", state.config.api_description);

    let result = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    state.shutdown().await;
    result?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => tracing::error!("Failed to install SIGTERM handler: {}", e),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::{ChatResponse, ErrorResponse, HealthResponse};
    use crate::llm::tests::{text_reply, tool_reply, ScriptedLlm};
    use crate::llm::{ModelSpec, ToolCall};
    use crate::tools::catalog::tests::spawn_toolbox;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use serde::de::DeserializeOwned;
    use tower::ServiceExt;

    fn app_state(mcp_server_url: &str, llm: Arc<ScriptedLlm>) -> Arc<AppState> {
        let config = Config::new(
            ModelSpec::parse("openai:gpt-4o-mini").unwrap(),
            "http://127.0.0.1:1".to_string(),
            mcp_server_url.to_string(),
        );
        Arc::new(AppState::new(config, llm))
    }

    async fn get_health(state: &Arc<AppState>) -> HealthResponse {
        let response = router(state.clone())
            .unwrap()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        read_json(response).await
    }

    async fn post_chat(state: &Arc<AppState>, prompt: &str) -> axum::response::Response {
        let body = serde_json::json!({ "prompt": prompt }).to_string();
        post_raw(state, body).await
    }

    async fn post_raw(state: &Arc<AppState>, body: String) -> axum::response::Response {
        router(state.clone())
            .unwrap()
            .oneshot(
                Request::post("/api/chat")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    async fn read_json<T: DeserializeOwned>(response: axum::response::Response) -> T {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_reports_readiness_across_startup() {
        let toolbox = spawn_toolbox().await;
        let state = app_state(&toolbox, Arc::new(ScriptedLlm::default()));

        let before = get_health(&state).await;
        assert_eq!(before.status, "healthy");
        assert_eq!(before.mcp_server, toolbox);
        assert!(!before.agent_ready);

        state.startup().await.unwrap();
        assert!(get_health(&state).await.agent_ready);
    }

    #[tokio::test]
    async fn chat_before_startup_is_unavailable() {
        let llm = Arc::new(ScriptedLlm::default());
        let state = app_state("http://127.0.0.1:1", llm.clone());

        let response = post_chat(&state, "hello").await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body: ErrorResponse = read_json(response).await;
        assert_eq!(body.detail, "Agent not initialized");
        assert_eq!(llm.calls(), 0);
    }

    #[tokio::test]
    async fn malformed_chat_body_gets_json_detail() {
        let llm = Arc::new(ScriptedLlm::default());
        let state = app_state(&spawn_toolbox().await, llm.clone());
        state.startup().await.unwrap();

        let response = post_raw(&state, "{not json".to_string()).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: ErrorResponse = read_json(response).await;
        assert!(body.detail.starts_with("Failed to parse the request body as JSON"));

        let response = post_raw(&state, r#"{"question": "hi"}"#.to_string()).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body: ErrorResponse = read_json(response).await;
        assert!(body.detail.contains("missing field `prompt`"));

        assert_eq!(llm.calls(), 0);
    }

    #[tokio::test]
    async fn chat_runs_tools_through_the_catalog() {
        let llm = Arc::new(ScriptedLlm::new(vec![
            tool_reply(vec![ToolCall::new("c1", "list_tables", r#"{"dataset":"sales"}"#)]),
            text_reply("Sales has orders and refunds."),
        ]));
        let state = app_state(&spawn_toolbox().await, llm.clone());
        state.startup().await.unwrap();

        let response = post_chat(&state, "what is in sales?").await;
        assert_eq!(response.status(), StatusCode::OK);
        let body: ChatResponse = read_json(response).await;
        assert_eq!(body.response, "Sales has orders and refunds.");
        assert_eq!(body.tool_calls_made, 1);

        let seen = llm.seen.lock().unwrap();
        let tool_message = &seen[1][2];
        assert_eq!(tool_message.content.as_deref(), Some("tables in sales"));
    }

    #[tokio::test]
    async fn upstream_failure_is_internal_error() {
        let llm = Arc::new(ScriptedLlm::new(vec![Err(anyhow::anyhow!("model overloaded"))]));
        let state = app_state(&spawn_toolbox().await, llm);
        state.startup().await.unwrap();

        let response = post_chat(&state, "hi").await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: ErrorResponse = read_json(response).await;
        assert_eq!(body.detail, "Error processing request: model overloaded");
    }

    #[tokio::test]
    async fn failed_startup_never_creates_the_agent() {
        let llm = Arc::new(ScriptedLlm::default());
        let state = app_state("http://127.0.0.1:1", llm.clone());

        assert!(state.startup().await.is_err());
        assert!(!state.agent.is_ready().await);
        assert!(!state.catalog.is_connected().await);

        let response = post_chat(&state, "hello").await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(llm.calls(), 0);
    }

    #[tokio::test]
    async fn shutdown_disconnects_catalog_but_keeps_agent() {
        let state = app_state(&spawn_toolbox().await, Arc::new(ScriptedLlm::default()));
        state.startup().await.unwrap();

        state.shutdown().await;
        state.shutdown().await;
        assert!(!state.catalog.is_connected().await);
        assert!(state.agent.is_ready().await);
    }
}
