//! BrowserManager: CDP browser lifecycle.
//!
//! Holds a single browser instance and page. The browser is launched lazily
//! on first use; `navigate` may relaunch it with different launch options.
//! Every page the manager creates has its console output recorded in the
//! shared [`ArtifactStore`].

use crate::artifacts::ArtifactStore;
use anyhow::{Context, Result};
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::js_protocol::runtime::{EventConsoleApiCalled, RemoteObject};
use chromiumoxide::Page;
use futures::StreamExt;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Chrome arguments that weaken browser security. Launching with any of
/// these requires an explicit opt-in.
pub const DANGEROUS_ARGS: &[&str] = &[
    "--no-sandbox",
    "--disable-setuid-sandbox",
    "--single-process",
    "--disable-web-security",
    "--ignore-certificate-errors",
    "--disable-features=IsolateOrigins",
    "--disable-site-isolation-trials",
    "--allow-running-insecure-content",
];

/// Configuration for the BrowserManager.
#[derive(Debug, Clone)]
pub struct BrowserManagerConfig {
    /// Custom Chrome/Edge binary path.
    pub browser_path: Option<String>,
    /// Connect to an already-running browser via CDP URL.
    pub cdp_url: Option<String>,
    /// Run headless (default: true).
    pub headless: bool,
    /// Browser window size.
    pub window_size: (u32, u32),
    /// Extra Chrome arguments for every launch.
    pub launch_args: Vec<String>,
    /// Permit [`DANGEROUS_ARGS`] without a per-call opt-in.
    pub allow_dangerous: bool,
}

impl Default for BrowserManagerConfig {
    fn default() -> Self {
        Self {
            browser_path: None,
            cdp_url: None,
            headless: true,
            window_size: (1280, 720),
            launch_args: Vec::new(),
            allow_dangerous: false,
        }
    }
}

/// Per-call launch overrides accepted by `navigate`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[schemars(deny_unknown_fields)]
pub struct LaunchOptions {
    #[schemars(description = "Run the browser headless (defaults to the server setting)")]
    pub headless: Option<bool>,

    #[schemars(description = "Additional Chrome command-line arguments")]
    pub args: Option<Vec<String>>,
}

/// Fully resolved launch parameters. A running browser is replaced only
/// when a new launch resolves to different parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSpec {
    pub headless: bool,
    pub args: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
#[error("Dangerous browser arguments require allow_dangerous: {}", .0.join(", "))]
pub struct DangerousArgs(pub Vec<String>);

fn is_dangerous(arg: &str) -> bool {
    DANGEROUS_ARGS.iter().any(|d| {
        if d.contains('=') {
            arg.starts_with(d)
        } else {
            arg == *d || arg.starts_with(&format!("{}=", d))
        }
    })
}

/// Reject dangerous arguments unless `allow` is set.
pub fn check_launch_args(args: &[String], allow: bool) -> Result<(), DangerousArgs> {
    if allow {
        return Ok(());
    }
    let rejected: Vec<String> = args.iter().filter(|a| is_dangerous(a)).cloned().collect();
    if rejected.is_empty() {
        Ok(())
    } else {
        Err(DangerousArgs(rejected))
    }
}

/// Render console call arguments the way devtools prints them.
pub fn console_text(args: &[RemoteObject]) -> String {
    args.iter()
        .map(|arg| match (&arg.value, &arg.description) {
            (Some(Value::String(s)), _) => s.clone(),
            (Some(value), _) => value.to_string(),
            (None, Some(description)) => description.clone(),
            (None, None) => "undefined".to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

struct Launched {
    browser: Browser,
    spec: LaunchSpec,
}

/// Central browser lifecycle manager.
pub struct BrowserManager {
    // Lock order: browser, then page.
    browser: RwLock<Option<Launched>>,
    page: RwLock<Option<Page>>,
    config: BrowserManagerConfig,
    artifacts: Arc<ArtifactStore>,
}

impl BrowserManager {
    pub fn new(config: BrowserManagerConfig, artifacts: Arc<ArtifactStore>) -> Self {
        Self {
            browser: RwLock::new(None),
            page: RwLock::new(None),
            config,
            artifacts,
        }
    }

    pub fn artifacts(&self) -> &Arc<ArtifactStore> {
        &self.artifacts
    }

    /// Merge per-call options over the server configuration and check the
    /// resulting arguments.
    pub fn resolve_launch(
        &self,
        options: Option<&LaunchOptions>,
        allow_dangerous: bool,
    ) -> Result<LaunchSpec, DangerousArgs> {
        let mut args = self.config.launch_args.clone();
        if let Some(extra) = options.and_then(|o| o.args.as_ref()) {
            args.extend(extra.iter().cloned());
        }

        check_launch_args(&args, allow_dangerous || self.config.allow_dangerous)?;

        Ok(LaunchSpec {
            headless: options
                .and_then(|o| o.headless)
                .unwrap_or(self.config.headless),
            args,
        })
    }

    /// Ensure a browser is running, launching one with the configured
    /// defaults if needed.
    pub async fn ensure_browser(&self) -> Result<()> {
        // Fast path: browser already running
        {
            let guard = self.browser.read().await;
            if guard.is_some() {
                return Ok(());
            }
        }

        let mut browser_guard = self.browser.write().await;
        // Double-check after acquiring write lock
        if browser_guard.is_some() {
            return Ok(());
        }

        let spec = self.resolve_launch(None, false)?;
        let browser = self.start_browser(&spec).await?;
        *browser_guard = Some(Launched { browser, spec });
        Ok(())
    }

    /// Ensure a browser launched with `spec` is running. A browser started
    /// with different parameters is closed and replaced.
    pub async fn launch(&self, spec: LaunchSpec) -> Result<()> {
        let mut browser_guard = self.browser.write().await;

        if let Some(current) = browser_guard.as_ref() {
            if current.spec == spec {
                return Ok(());
            }
            if self.config.cdp_url.is_some() {
                tracing::warn!("Launch options ignored for a CDP-connected browser");
                return Ok(());
            }

            tracing::info!(
                headless = spec.headless,
                args = ?spec.args,
                "Launch options changed, relaunching browser"
            );
            self.page.write().await.take();
            if let Some(mut old) = browser_guard.take() {
                if let Err(e) = old.browser.close().await {
                    tracing::warn!("Failed to close previous browser: {}", e);
                }
            }
        }

        let browser = self.start_browser(&spec).await?;
        *browser_guard = Some(Launched { browser, spec });
        Ok(())
    }

    async fn start_browser(&self, spec: &LaunchSpec) -> Result<Browser> {
        let browser = if let Some(ref cdp_url) = self.config.cdp_url {
            let (browser, mut handler) = Browser::connect(cdp_url)
                .await
                .with_context(|| format!("Failed to connect to browser at {}", cdp_url))?;

            tokio::spawn(async move {
                while let Some(h) = handler.next().await {
                    if h.is_err() {
                        break;
                    }
                }
            });

            tracing::info!(cdp_url = %cdp_url, "Connected to browser");
            browser
        } else {
            let mut builder = BrowserConfig::builder();

            if let Some(ref path) = self.config.browser_path {
                builder = builder.chrome_executable(path);
            }

            if !spec.headless {
                builder = builder.with_head();
            }

            builder = builder.window_size(self.config.window_size.0, self.config.window_size.1);

            // Chrome args for stability and compatibility
            builder = builder
                .arg("--disable-dev-shm-usage")
                .arg("--remote-allow-origins=*");

            for arg in &spec.args {
                builder = builder.arg(arg.clone());
            }

            let config = builder.build().map_err(|e| anyhow::anyhow!("{}", e))?;

            let (browser, mut handler) = Browser::launch(config)
                .await
                .context("Failed to launch browser")?;

            tokio::spawn(async move {
                while let Some(h) = handler.next().await {
                    if h.is_err() {
                        break;
                    }
                }
            });

            tracing::info!(headless = spec.headless, "Browser launched");
            browser
        };

        Ok(browser)
    }

    /// Get or create the active page.
    pub async fn page(&self) -> Result<Page> {
        self.ensure_browser().await?;

        let browser_guard = self.browser.read().await;
        let launched = browser_guard.as_ref().context("Browser not initialized")?;

        let mut page_guard = self.page.write().await;
        if let Some(ref page) = *page_guard {
            return Ok(page.clone());
        }

        let page = launched
            .browser
            .new_page("about:blank")
            .await
            .context("Failed to create new page")?;

        self.capture_console(&page).await;

        *page_guard = Some(page.clone());
        Ok(page)
    }

    async fn capture_console(&self, page: &Page) {
        let mut events = match page.event_listener::<EventConsoleApiCalled>().await {
            Ok(events) => events,
            Err(e) => {
                tracing::warn!("Console capture unavailable: {}", e);
                return;
            }
        };

        let artifacts = self.artifacts.clone();
        tokio::spawn(async move {
            while let Some(event) = events.next().await {
                artifacts.push_console(event.r#type.as_ref(), &console_text(&event.args));
            }
        });
    }

    /// Close the page and browser. A CDP-connected browser is disconnected
    /// but left running.
    pub async fn shutdown(&self) {
        let mut browser_guard = self.browser.write().await;
        self.page.write().await.take();

        let Some(mut launched) = browser_guard.take() else {
            return;
        };

        if self.config.cdp_url.is_some() {
            tracing::info!("Disconnected from browser");
            return;
        }

        match launched.browser.close().await {
            Ok(_) => tracing::info!("Browser closed"),
            Err(e) => tracing::warn!("Failed to close browser: {}", e),
        }
    }
}
