//! Shared MCP plumbing for all servers in this workspace.
//!
//! Binary servers build a pmcp `ServerCore` with their tools and call [`run`]
//! with the flattened [`CliArgs`].

pub mod handler;
pub mod session;
pub mod transport;

pub use handler::McpHandler;

use pmcp::server::adapters::{StdioAdapter, TransportAdapter};
use pmcp::server::core::{ProtocolHandler, ServerCore};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use transport::sse::SseServer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Transport {
    /// HTTP with Server-Sent Events (`/sse` + `/messages`)
    Sse,
    /// Newline-delimited JSON-RPC on stdin/stdout
    Stdio,
}

/// CLI arguments shared across all MCP servers.
#[derive(Debug, Clone, clap::Args)]
pub struct CliArgs {
    /// Host to bind to
    #[clap(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Port to bind to
    #[clap(long, default_value = "3100")]
    pub port: u16,

    /// Transport to serve on
    #[clap(long, value_enum, default_value = "sse")]
    pub transport: Transport,
}

/// Run an MCP server on the transport selected by `args`.
///
/// Initializes tracing, then serves until the transport ends.
pub async fn run(server: ServerCore, args: &CliArgs) -> anyhow::Result<()> {
    init_logging();

    let protocol: Arc<dyn ProtocolHandler> = Arc::new(server);
    match args.transport {
        Transport::Stdio => run_stdio(protocol).await,
        Transport::Sse => run_sse(McpHandler::new(protocol), args).await,
    }
}

async fn run_stdio(protocol: Arc<dyn ProtocolHandler>) -> anyhow::Result<()> {
    tracing::info!("MCP server starting on STDIO");

    StdioAdapter::new().serve(protocol).await?;

    tracing::info!("MCP server STDIO closed");
    Ok(())
}

async fn run_sse(handler: McpHandler, args: &CliArgs) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;

    tracing::info!(host = %args.host, port = args.port, "Starting MCP SSE server");

    let (bound, server_handle) = SseServer::new(addr, handler).start().await?;

    tracing::info!("MCP server listening on http://{}/sse", bound);

    server_handle.await??;

    Ok(())
}

fn init_logging() {
    // stdout belongs to the stdio transport
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[clap(flatten)]
        server: CliArgs,
    }

    #[test]
    fn test_cli_args_defaults() {
        let cli = TestCli::parse_from(["test"]);
        assert_eq!(cli.server.host, "127.0.0.1");
        assert_eq!(cli.server.port, 3100);
        assert_eq!(cli.server.transport, Transport::Sse);
    }

    #[test]
    fn test_cli_args_custom() {
        let cli = TestCli::parse_from([
            "test",
            "--host",
            "0.0.0.0",
            "--port",
            "8080",
            "--transport",
            "stdio",
        ]);
        assert_eq!(cli.server.host, "0.0.0.0");
        assert_eq!(cli.server.port, 8080);
        assert_eq!(cli.server.transport, Transport::Stdio);
    }
}
