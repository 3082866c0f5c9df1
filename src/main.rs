//! toolbox-chat - HTTP Server Entry Point
//!
//! Loads configuration, connects to the toolbox and serves the chat API.

use toolbox_chat::{api, config::Config};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "toolbox_chat=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    info!(
        "Loaded configuration: model={} toolbox={}",
        config.llm.model, config.mcp_server_url
    );

    api::serve(config).await?;

    Ok(())
}
