//! MCP tools for US National Weather Service alerts and forecasts.

pub mod client;
pub mod tools;

pub use client::{WeatherClient, WeatherConfig};

use pmcp::server::builder::ServerCoreBuilder;
use pmcp::server::core::ServerCore;
use pmcp::types::{ServerCapabilities, ToolCapabilities};
use std::sync::Arc;

pub const SERVER_NAME: &str = "weather";

/// Build the weather MCP server with all tools registered.
pub fn build_server(config: WeatherConfig) -> pmcp::Result<ServerCore> {
    tracing::debug!(api_base = %config.api_base, "Configuring NWS client");

    let client = WeatherClient::new(config)
        .map_err(|e| pmcp::Error::internal(format!("Failed to create weather client: {:#}", e)))?;

    let builder = ServerCoreBuilder::new()
        .name(SERVER_NAME)
        .version(env!("CARGO_PKG_VERSION"))
        .capabilities(ServerCapabilities {
            tools: Some(ToolCapabilities {
                list_changed: Some(false),
            }),
            ..Default::default()
        });

    tools::register_tools(builder, Arc::new(client)).build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pmcp::server::core::ProtocolHandler;

    #[test]
    fn test_build_server() {
        let server = build_server(WeatherConfig::default()).unwrap();
        assert_eq!(server.info().name, "weather");
        assert!(server.capabilities().tools.is_some());
        assert!(server.capabilities().resources.is_none());
    }
}
