//! Toolbox catalog client and the adapter that turns catalog tools into
//! agent [`Tool`]s.
//!
//! The toolbox server publishes a toolset manifest at `GET /api/toolset/{name}`
//! and runs a tool at `POST /api/tool/{name}/invoke`, answering with
//! `{"result": ...}`.

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use super::Tool;

/// Manifest returned by the toolset endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolsetManifest {
    #[serde(rename = "serverVersion", default)]
    pub server_version: String,

    /// Tools keyed by name
    #[serde(default)]
    pub tools: BTreeMap<String, ToolManifest>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ToolManifest {
    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub parameters: Vec<ParameterSchema>,
}

/// One toolbox parameter.
#[derive(Debug, Clone, Deserialize)]
pub struct ParameterSchema {
    #[serde(default)]
    pub name: String,

    #[serde(rename = "type")]
    pub param_type: String,

    #[serde(default)]
    pub description: String,

    #[serde(default = "default_required")]
    pub required: bool,

    /// Element schema for `array` parameters
    #[serde(default)]
    pub items: Option<Box<ParameterSchema>>,
}

fn default_required() -> bool {
    true
}

impl ParameterSchema {
    fn to_json_schema(&self) -> Value {
        let mut schema = Map::new();
        let json_type = match self.param_type.as_str() {
            "float" => "number",
            other => other,
        };
        schema.insert("type".to_string(), json!(json_type));
        if !self.description.is_empty() {
            schema.insert("description".to_string(), json!(self.description));
        }
        if let Some(items) = &self.items {
            schema.insert("items".to_string(), items.to_json_schema());
        }
        Value::Object(schema)
    }
}

/// A tool as described by the catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    /// JSON schema of the arguments object
    pub parameters: Value,
}

impl ToolDescriptor {
    pub fn from_manifest(name: &str, manifest: &ToolManifest) -> Self {
        let properties: Map<String, Value> = manifest
            .parameters
            .iter()
            .map(|p| (p.name.clone(), p.to_json_schema()))
            .collect();
        let required: Vec<&str> = manifest
            .parameters
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect();

        Self {
            name: name.to_string(),
            description: manifest.description.clone(),
            parameters: json!({
                "type": "object",
                "properties": properties,
                "required": required,
            }),
        }
    }
}

/// HTTP client for a toolbox server.
#[derive(Debug)]
pub struct ToolboxClient {
    client: reqwest::Client,
    base_url: String,
}

impl ToolboxClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Load a toolset; `None` loads the default toolset with every tool.
    pub async fn load_toolset(&self, toolset: Option<&str>) -> anyhow::Result<Vec<ToolDescriptor>> {
        let url = format!("{}/api/toolset/{}", self.base_url, toolset.unwrap_or(""));
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Failed to connect to toolbox at {}", self.base_url))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("Toolbox returned {} loading toolset: {}", status, text);
        }

        let manifest: ToolsetManifest = response
            .json()
            .await
            .context("Invalid toolset manifest")?;

        tracing::debug!(
            "Toolbox {} (server version {}) listed {} tools",
            self.base_url,
            manifest.server_version,
            manifest.tools.len()
        );

        Ok(manifest
            .tools
            .iter()
            .map(|(name, tool)| ToolDescriptor::from_manifest(name, tool))
            .collect())
    }

    /// Invoke a tool and return its `result` value unchanged.
    pub async fn invoke(&self, tool: &str, args: Value) -> anyhow::Result<Value> {
        let url = format!("{}/api/tool/{}/invoke", self.base_url, tool);
        let args = if args.is_null() { json!({}) } else { args };

        let response = self
            .client
            .post(&url)
            .json(&args)
            .send()
            .await
            .with_context(|| format!("Failed to reach toolbox for tool '{}'", tool))?;

        let status = response.status();
        let body: Value = response.json().await.unwrap_or(Value::Null);

        if let Some(error) = body.get("error").filter(|e| !e.is_null()) {
            let message = error
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| error.to_string());
            anyhow::bail!("Tool '{}' failed: {}", tool, message);
        }
        if !status.is_success() {
            anyhow::bail!("Tool '{}' failed with status {}", tool, status);
        }

        body.get("result")
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("Tool '{}' returned no result", tool))
    }
}

/// A catalog tool bound to the client that invokes it.
pub struct CatalogTool {
    descriptor: ToolDescriptor,
    client: Arc<ToolboxClient>,
}

impl CatalogTool {
    pub fn new(descriptor: ToolDescriptor, client: Arc<ToolboxClient>) -> Self {
        Self { descriptor, client }
    }
}

#[async_trait]
impl Tool for CatalogTool {
    fn name(&self) -> &str {
        &self.descriptor.name
    }

    fn description(&self) -> &str {
        &self.descriptor.description
    }

    fn parameters_schema(&self) -> Value {
        self.descriptor.parameters.clone()
    }

    async fn execute(&self, args: Value) -> anyhow::Result<Value> {
        self.client.invoke(&self.descriptor.name, args).await
    }
}

/// Wrap catalog descriptors as agent tools, one per descriptor, in order.
pub fn wrap_catalog_tools(
    descriptors: Vec<ToolDescriptor>,
    client: Arc<ToolboxClient>,
) -> Vec<Arc<dyn Tool>> {
    descriptors
        .into_iter()
        .map(|d| Arc::new(CatalogTool::new(d, client.clone())) as Arc<dyn Tool>)
        .collect()
}
