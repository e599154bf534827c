//! Active weather alerts for a US state.

use crate::client::{AlertProperties, WeatherClient};
use pmcp::Error;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, JsonSchema, Validate)]
#[schemars(deny_unknown_fields)]
pub struct GetAlertsInput {
    /// Two-letter state code
    #[validate(length(equal = 2))]
    #[schemars(description = "Two-letter state code (e.g. CA, NY)")]
    pub state: String,
}

/// One alert as a text block.
pub fn format_alert(alert: &AlertProperties) -> String {
    format!(
        "Event: {}\nArea: {}\nSeverity: {}\nStatus: {}\nHeadline: {}\n---",
        alert.event.as_deref().unwrap_or("Unknown"),
        alert.area_desc.as_deref().unwrap_or("Unknown"),
        alert.severity.as_deref().unwrap_or("Unknown"),
        alert.status.as_deref().unwrap_or("Unknown"),
        alert.headline.as_deref().unwrap_or("No headline"),
    )
}

/// Upstream failures are reported in `text`, not as errors.
pub async fn execute(
    client: &Arc<WeatherClient>,
    input: GetAlertsInput,
) -> Result<serde_json::Value, Error> {
    input
        .validate()
        .map_err(|e| Error::validation(format!("Validation failed: {}", e)))?;

    let state = input.state.to_uppercase();

    let alerts = match client.alerts(&state).await {
        Ok(alerts) => alerts,
        Err(e) => {
            tracing::warn!(state = %state, error = %e, "Alerts request failed");
            return Ok(json!({
                "state": state,
                "text": "Failed to retrieve alerts data"
            }));
        }
    };

    if alerts.features.is_empty() {
        return Ok(json!({
            "state": state,
            "count": 0,
            "text": format!("No active alerts for {}", state)
        }));
    }

    let formatted: Vec<String> = alerts
        .features
        .iter()
        .map(|feature| format_alert(&feature.properties))
        .collect();

    Ok(json!({
        "state": state,
        "count": formatted.len(),
        "text": format!("Active alerts for {}:\n\n{}", state, formatted.join("\n"))
    }))
}
