//! Take a named screenshot of the page or one element.

use crate::browser::BrowserManager;
use base64::Engine;
use chromiumoxide::cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams;
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::page::ScreenshotParams;
use pmcp::Error;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use validator::Validate;

fn default_width() -> u32 {
    800
}

fn default_height() -> u32 {
    600
}

#[derive(Debug, Serialize, Deserialize, JsonSchema, Validate)]
#[schemars(deny_unknown_fields)]
pub struct ScreenshotInput {
    /// Name the screenshot is stored under
    #[validate(length(min = 1))]
    #[schemars(description = "Name for the screenshot")]
    pub name: String,

    #[schemars(description = "CSS selector of an element to screenshot (optional)")]
    pub selector: Option<String>,

    #[serde(default = "default_width")]
    #[validate(range(min = 1, max = 7680))]
    #[schemars(description = "Viewport width in pixels (default: 800)")]
    pub width: u32,

    #[serde(default = "default_height")]
    #[validate(range(min = 1, max = 4320))]
    #[schemars(description = "Viewport height in pixels (default: 600)")]
    pub height: u32,

    #[serde(default)]
    #[schemars(
        description = "Return the screenshot as a base64 data URI text instead of an image (default: false)"
    )]
    pub encoded: bool,
}

pub async fn execute(
    manager: &Arc<BrowserManager>,
    input: ScreenshotInput,
) -> Result<Value, Error> {
    input
        .validate()
        .map_err(|e| Error::validation(format!("Validation failed: {}", e)))?;

    let page = manager
        .page()
        .await
        .map_err(|e| Error::internal(format!("Browser error: {:#}", e)))?;

    let fail = |e: &dyn std::fmt::Display| {
        Error::internal(format!("Failed to take screenshot {}: {}", input.name, e))
    };

    page.execute(SetDeviceMetricsOverrideParams::new(
        i64::from(input.width),
        i64::from(input.height),
        1.0,
        false,
    ))
    .await
    .map_err(|e| fail(&e))?;

    let png_bytes = if let Some(ref selector) = input.selector {
        let element = page
            .find_element(selector)
            .await
            .map_err(|e| fail(&format!("element not found '{}': {}", selector, e)))?;

        element
            .screenshot(CaptureScreenshotFormat::Png)
            .await
            .map_err(|e| fail(&e))?
    } else {
        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .full_page(false)
            .build();

        page.screenshot(params).await.map_err(|e| fail(&e))?
    };

    let b64 = base64::engine::general_purpose::STANDARD.encode(&png_bytes);
    manager
        .artifacts()
        .store_screenshot(&input.name, b64.clone(), input.width, input.height);

    tracing::debug!(name = %input.name, size_bytes = png_bytes.len(), "Screenshot taken");

    let mut reply = json!({
        "name": input.name,
        "width": input.width,
        "height": input.height,
        "size_bytes": png_bytes.len(),
        "resource": format!("screenshot://{}", input.name),
    });
    if input.encoded {
        reply["data_uri"] = json!(format!("data:image/png;base64,{}", b64));
    } else {
        reply["media_type"] = json!("image/png");
        reply["data"] = json!(b64);
    }

    Ok(reply)
}
