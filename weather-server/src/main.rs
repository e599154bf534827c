use clap::Parser;
use mcp_weather_core::client::{NWS_API_BASE, USER_AGENT};
use mcp_weather_core::WeatherConfig;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "weather-server", about = "NWS Weather MCP Server")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Start the MCP server (default)
    Serve(ServeArgs),
}

#[derive(Parser)]
struct ServeArgs {
    #[clap(flatten)]
    server: server_common::CliArgs,

    /// Base URL of the NWS API
    #[clap(long, default_value = NWS_API_BASE)]
    api_base: String,

    /// User-Agent sent with every NWS request
    #[clap(long, default_value = USER_AGENT)]
    user_agent: String,

    /// Per-request timeout in seconds
    #[clap(long, default_value = "30")]
    timeout_secs: u64,
}

impl ServeArgs {
    fn weather_config(&self) -> WeatherConfig {
        WeatherConfig {
            api_base: self.api_base.clone(),
            user_agent: self.user_agent.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let args = match cli.command {
        Some(Command::Serve(args)) => args,
        None => ServeArgs::parse_from(["weather-server"]),
    };

    let server = mcp_weather_core::build_server(args.weather_config())?;
    server_common::run(server, &args.server).await
}
