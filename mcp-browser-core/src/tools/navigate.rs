//! Navigate to a URL, optionally relaunching the browser first.

use crate::browser::{BrowserManager, LaunchOptions};
use pmcp::Error;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, JsonSchema, Validate)]
#[schemars(deny_unknown_fields)]
pub struct NavigateInput {
    /// URL to navigate to
    #[validate(length(min = 1))]
    #[schemars(description = "The URL to navigate to")]
    pub url: String,

    /// Relaunch the browser with these options if they differ from the
    /// running browser's
    #[serde(default)]
    #[schemars(description = "Browser launch options (headless, args)")]
    pub launch_options: Option<LaunchOptions>,

    #[serde(default)]
    #[schemars(
        description = "Allow security-reducing launch arguments such as --no-sandbox (default: false)"
    )]
    pub allow_dangerous: bool,
}

pub async fn execute(
    manager: &Arc<BrowserManager>,
    input: NavigateInput,
) -> Result<serde_json::Value, Error> {
    input
        .validate()
        .map_err(|e| Error::validation(format!("Validation failed: {}", e)))?;

    if let Some(ref options) = input.launch_options {
        let spec = manager
            .resolve_launch(Some(options), input.allow_dangerous)
            .map_err(|e| Error::validation(e.to_string()))?;
        manager
            .launch(spec)
            .await
            .map_err(|e| Error::internal(format!("Browser error: {:#}", e)))?;
    }

    let page = manager
        .page()
        .await
        .map_err(|e| Error::internal(format!("Browser error: {:#}", e)))?;

    page.goto(&input.url)
        .await
        .map_err(|e| Error::internal(format!("Failed to navigate to {}: {}", input.url, e)))?;

    tracing::debug!(url = %input.url, "Navigated");

    Ok(json!({
        "status": "navigated",
        "url": input.url
    }))
}
