//! Fill a form field.

use crate::browser::BrowserManager;
use pmcp::Error;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, JsonSchema, Validate)]
#[schemars(deny_unknown_fields)]
pub struct FillInput {
    /// CSS selector of the form field to fill
    #[validate(length(min = 1))]
    #[schemars(description = "CSS selector for input field")]
    pub selector: String,

    #[schemars(description = "Value to fill")]
    pub value: String,
}

pub async fn execute(
    manager: &Arc<BrowserManager>,
    input: FillInput,
) -> Result<serde_json::Value, Error> {
    input
        .validate()
        .map_err(|e| Error::validation(format!("Validation failed: {}", e)))?;

    let page = manager
        .page()
        .await
        .map_err(|e| Error::internal(format!("Browser error: {:#}", e)))?;

    let fail = |e: &dyn std::fmt::Display| {
        Error::internal(format!("Failed to fill {}: {}", input.selector, e))
    };

    let element = page.find_element(&input.selector).await.map_err(|e| fail(&e))?;

    // Clear any existing value, then focus and type
    element
        .call_js_fn("function() { this.value = ''; }", false)
        .await
        .map_err(|e| fail(&e))?;
    element.click().await.map_err(|e| fail(&e))?;
    element.type_str(&input.value).await.map_err(|e| fail(&e))?;

    Ok(json!({
        "status": "filled",
        "selector": input.selector,
        "value": input.value
    }))
}
