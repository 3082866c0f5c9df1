//! Toolbox catalog connection lifecycle.

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::tools::catalog::{wrap_catalog_tools, ToolboxClient};
use crate::tools::Tool;

/// Owns the connection to the toolbox server.
///
/// Tools hold their own handle to the client, so calls already in flight
/// finish normally after `disconnect`.
pub struct CatalogService {
    base_url: String,
    client: RwLock<Option<Arc<ToolboxClient>>>,
}

impl CatalogService {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: RwLock::new(None),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Connect to the toolbox, load every tool and return the wrapped set.
    ///
    /// On failure the service stays disconnected.
    pub async fn connect(&self) -> anyhow::Result<Vec<Arc<dyn Tool>>> {
        let client = Arc::new(ToolboxClient::new(&self.base_url));
        let descriptors = client.load_toolset(None).await?;
        let tools = wrap_catalog_tools(descriptors, client.clone());

        tracing::info!("Loaded {} tools from toolbox {}", tools.len(), self.base_url);

        *self.client.write().await = Some(client);
        Ok(tools)
    }

    /// Drop the connection. Safe to call when not connected.
    pub async fn disconnect(&self) {
        if let Some(client) = self.client.write().await.take() {
            tracing::info!("Disconnected from toolbox {}", client.base_url());
        }
    }

    pub async fn is_connected(&self) -> bool {
        self.client.read().await.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::catalog::tests::spawn_toolbox;

    #[tokio::test]
    async fn connect_loads_tools() {
        let service = CatalogService::new(spawn_toolbox().await);

        let tools = service.connect().await.unwrap();
        assert_eq!(tools.len(), 2);
        assert!(service.is_connected().await);
    }

    #[tokio::test]
    async fn disconnect_twice_is_a_noop() {
        let service = CatalogService::new(spawn_toolbox().await);
        service.connect().await.unwrap();

        service.disconnect().await;
        service.disconnect().await;
        assert!(!service.is_connected().await);
    }

    #[tokio::test]
    async fn disconnect_without_connect_does_not_fail() {
        let service = CatalogService::new("http://127.0.0.1:5000");
        service.disconnect().await;
        assert!(!service.is_connected().await);
    }

    #[tokio::test]
    async fn failed_connect_leaves_service_disconnected() {
        let service = CatalogService::new("http://127.0.0.1:1");
        assert!(service.connect().await.is_err());
        assert!(!service.is_connected().await);
    }

    #[tokio::test]
    async fn tools_outlive_disconnect() {
        let service = CatalogService::new(spawn_toolbox().await);
        let tools = service.connect().await.unwrap();
        service.disconnect().await;

        let list_tables = tools.iter().find(|t| t.name() == "list_tables").unwrap();
        let result = list_tables
            .execute(serde_json::json!({"dataset": "ops"}))
            .await
            .unwrap();
        assert_eq!(result, "tables in ops");
    }
}
