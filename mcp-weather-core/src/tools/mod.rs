//! Tool registration for the weather tools.

pub mod get_alerts;
pub mod get_forecast;

use crate::client::WeatherClient;
use pmcp::server::builder::ServerCoreBuilder;
use pmcp::TypedTool;
use std::sync::Arc;

/// Register all weather tools onto the server builder.
///
/// Each tool captures an `Arc<WeatherClient>` for NWS access.
pub fn register_tools(
    builder: ServerCoreBuilder,
    client: Arc<WeatherClient>,
) -> ServerCoreBuilder {
    let c = client.clone();
    let builder = builder.tool(
        "get_alerts",
        TypedTool::new(
            "get_alerts",
            move |input: get_alerts::GetAlertsInput, _extra| {
                let c = c.clone();
                Box::pin(async move { get_alerts::execute(&c, input).await })
            },
        )
        .with_description("Get weather alerts for a state"),
    );

    let c = client;
    builder.tool(
        "get_forecast",
        TypedTool::new(
            "get_forecast",
            move |input: get_forecast::GetForecastInput, _extra| {
                let c = c.clone();
                Box::pin(async move { get_forecast::execute(&c, input).await })
            },
        )
        .with_description("Get weather forecast for a location"),
    )
}
