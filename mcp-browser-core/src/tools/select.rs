//! Choose an option in a `<select>` element.

use crate::browser::BrowserManager;
use pmcp::Error;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, JsonSchema, Validate)]
#[schemars(deny_unknown_fields)]
pub struct SelectInput {
    #[validate(length(min = 1))]
    #[schemars(description = "CSS selector for element to select")]
    pub selector: String,

    #[schemars(description = "Value to select")]
    pub value: String,
}

/// Function body run with `this` bound to the select element. Matches the
/// option by value, then by label, and fires the events a user choice would.
pub fn select_js(value: &str) -> Result<String, serde_json::Error> {
    let value = serde_json::to_string(value)?;
    Ok(format!(
        r#"function() {{
    const wanted = {value};
    const option = Array.from(this.options || []).find(o => o.value === wanted)
        || Array.from(this.options || []).find(o => o.label === wanted);
    if (!option) {{
        throw new Error('No option with value or label ' + JSON.stringify(wanted));
    }}
    this.value = option.value;
    this.dispatchEvent(new Event('input', {{ bubbles: true }}));
    this.dispatchEvent(new Event('change', {{ bubbles: true }}));
}}"#
    ))
}

pub async fn execute(
    manager: &Arc<BrowserManager>,
    input: SelectInput,
) -> Result<serde_json::Value, Error> {
    input
        .validate()
        .map_err(|e| Error::validation(format!("Validation failed: {}", e)))?;

    let page = manager
        .page()
        .await
        .map_err(|e| Error::internal(format!("Browser error: {:#}", e)))?;

    let fail = |e: &dyn std::fmt::Display| {
        Error::internal(format!("Failed to select {}: {}", input.selector, e))
    };

    let element = page.find_element(&input.selector).await.map_err(|e| fail(&e))?;
    let script = select_js(&input.value).map_err(|e| fail(&e))?;

    let returns = element
        .call_js_fn(script, false)
        .await
        .map_err(|e| fail(&e))?;

    if let Some(details) = returns.exception_details {
        return Err(fail(&details.text));
    }

    Ok(json!({
        "status": "selected",
        "selector": input.selector,
        "value": input.value
    }))
}
