//! Tool registration for all browser automation tools.

pub mod click;
pub mod evaluate;
pub mod fill;
pub mod hover;
pub mod navigate;
pub mod screenshot;
pub mod select;

use crate::browser::BrowserManager;
use pmcp::server::builder::ServerCoreBuilder;
use pmcp::TypedTool;
use std::sync::Arc;

/// Register all browser tools onto the server builder.
///
/// Each tool captures an `Arc<BrowserManager>` for browser access.
pub fn register_tools(
    builder: ServerCoreBuilder,
    manager: Arc<BrowserManager>,
) -> ServerCoreBuilder {
    // --- Navigation & capture ---

    let m = manager.clone();
    let builder = builder.tool(
        "navigate",
        TypedTool::new("navigate", move |input: navigate::NavigateInput, _extra| {
            let m = m.clone();
            Box::pin(async move { navigate::execute(&m, input).await })
        })
        .with_description(
            "Navigate to a URL. Optional launch_options relaunch the browser with different settings.",
        ),
    );

    let m = manager.clone();
    let builder = builder.tool(
        "screenshot",
        TypedTool::new(
            "screenshot",
            move |input: screenshot::ScreenshotInput, _extra| {
                let m = m.clone();
                Box::pin(async move { screenshot::execute(&m, input).await })
            },
        )
        .with_description(
            "Take a screenshot of the current page or a specific element. Stored screenshots are available as screenshot://<name> resources.",
        ),
    );

    // --- Input automation ---

    let m = manager.clone();
    let builder = builder.tool(
        "click",
        TypedTool::new("click", move |input: click::ClickInput, _extra| {
            let m = m.clone();
            Box::pin(async move { click::execute(&m, input).await })
        })
        .with_description("Click an element on the page"),
    );

    let m = manager.clone();
    let builder = builder.tool(
        "fill",
        TypedTool::new("fill", move |input: fill::FillInput, _extra| {
            let m = m.clone();
            Box::pin(async move { fill::execute(&m, input).await })
        })
        .with_description("Fill out an input field"),
    );

    let m = manager.clone();
    let builder = builder.tool(
        "select",
        TypedTool::new("select", move |input: select::SelectInput, _extra| {
            let m = m.clone();
            Box::pin(async move { select::execute(&m, input).await })
        })
        .with_description("Select an element on the page with a Select tag"),
    );

    let m = manager.clone();
    let builder = builder.tool(
        "hover",
        TypedTool::new("hover", move |input: hover::HoverInput, _extra| {
            let m = m.clone();
            Box::pin(async move { hover::execute(&m, input).await })
        })
        .with_description("Hover an element on the page"),
    );

    // --- Scripting ---

    let m = manager;
    builder.tool(
        "evaluate",
        TypedTool::new("evaluate", move |input: evaluate::EvaluateInput, _extra| {
            let m = m.clone();
            Box::pin(async move { evaluate::execute(&m, input).await })
        })
        .with_description("Execute JavaScript in the browser console"),
    )
}
