//! Long-lived services owned by the application context.

mod agent_service;
mod catalog_service;

pub use agent_service::AgentService;
pub use catalog_service::CatalogService;
