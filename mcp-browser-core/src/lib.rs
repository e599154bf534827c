//! Browser automation MCP server core library.
//!
//! Provides `build_server()` which constructs a fully-configured MCP server
//! core with browser automation tools and console/screenshot resources.

pub mod artifacts;
pub mod browser;
pub mod resources;
pub mod tools;

use artifacts::ArtifactStore;
use browser::{BrowserManager, BrowserManagerConfig};
use pmcp::server::builder::ServerCoreBuilder;
use pmcp::server::core::ServerCore;
use pmcp::types::{ResourceCapabilities, ServerCapabilities, ToolCapabilities};
use resources::BrowserResources;
use std::sync::Arc;

pub const SERVER_NAME: &str = "browser";

/// Build a fully-configured MCP server with browser automation capabilities.
///
/// The returned manager owns the browser; call
/// [`BrowserManager::shutdown`] before exiting.
pub fn build_server(
    config: BrowserManagerConfig,
) -> pmcp::Result<(ServerCore, Arc<BrowserManager>)> {
    let artifacts = Arc::new(ArtifactStore::new());
    let manager = Arc::new(BrowserManager::new(config, artifacts.clone()));

    let builder = ServerCoreBuilder::new()
        .name(SERVER_NAME)
        .version(env!("CARGO_PKG_VERSION"))
        .resources(BrowserResources::new(artifacts))
        .capabilities(ServerCapabilities {
            tools: Some(ToolCapabilities {
                list_changed: Some(false),
            }),
            resources: Some(ResourceCapabilities {
                subscribe: Some(false),
                list_changed: Some(true),
            }),
            ..Default::default()
        });

    let server = tools::register_tools(builder, manager.clone()).build()?;
    Ok((server, manager))
}
