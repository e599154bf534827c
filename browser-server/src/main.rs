//! Browser Automation MCP Server binary.
//!
//! `serve` (the default) starts the MCP server over HTTP + SSE or stdio.

use clap::{Parser, Subcommand};
use mcp_browser_core::browser::BrowserManagerConfig;

#[derive(Parser)]
#[command(name = "browser-server", about = "Browser Automation MCP Server")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Start the MCP server (default when no subcommand given)
    Serve(ServeArgs),
}

#[derive(Parser)]
struct ServeArgs {
    #[clap(flatten)]
    server: server_common::CliArgs,

    /// Custom Chrome/Edge binary path
    #[clap(long)]
    browser_path: Option<String>,

    /// Connect to already-running browser via CDP URL
    #[clap(long)]
    cdp_url: Option<String>,

    /// Run browser in headless mode
    #[clap(long, default_value_t = true, action = clap::ArgAction::Set)]
    headless: bool,

    /// Extra Chrome argument for every launch (repeatable)
    #[clap(long = "launch-arg", value_name = "ARG", allow_hyphen_values = true)]
    launch_args: Vec<String>,

    /// Permit security-reducing Chrome arguments such as --no-sandbox
    #[clap(long)]
    allow_dangerous: bool,
}

impl ServeArgs {
    fn browser_config(&self) -> BrowserManagerConfig {
        BrowserManagerConfig {
            browser_path: self.browser_path.clone(),
            cdp_url: self.cdp_url.clone(),
            headless: self.headless,
            window_size: (1280, 720),
            launch_args: self.launch_args.clone(),
            allow_dangerous: self.allow_dangerous,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let args = match cli.command {
        Some(Command::Serve(args)) => args,
        None => ServeArgs::parse_from(["browser-server"]),
    };

    let (server, manager) = mcp_browser_core::build_server(args.browser_config())?;

    let result = tokio::select! {
        result = server_common::run(server, &args.server) => result,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Ctrl+C received, shutting down browser");
            Ok(())
        }
    };

    manager.shutdown().await;
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn serve(argv: &[&str]) -> ServeArgs {
        match Cli::parse_from(argv).command {
            Some(Command::Serve(args)) => args,
            None => panic!("expected serve"),
        }
    }

    #[test]
    fn test_serve_defaults() {
        let args = serve(&["browser-server", "serve"]);
        let config = args.browser_config();
        assert!(config.headless);
        assert!(!config.allow_dangerous);
        assert!(config.launch_args.is_empty());
        assert!(config.cdp_url.is_none());
    }

    #[test]
    fn test_serve_browser_flags() {
        let args = serve(&[
            "browser-server",
            "serve",
            "--port",
            "3101",
            "--headless",
            "false",
            "--launch-arg",
            "--lang=fr",
            "--launch-arg",
            "--no-sandbox",
            "--allow-dangerous",
        ]);
        let config = args.browser_config();
        assert_eq!(args.server.port, 3101);
        assert!(!config.headless);
        assert_eq!(config.launch_args, vec!["--lang=fr", "--no-sandbox"]);
        assert!(config.allow_dangerous);
    }
}
