//! MCP resources for captured browser state.
//!
//! - `console://logs`: every console message seen on the page
//! - `screenshot://<name>`: each stored screenshot as a PNG image

use crate::artifacts::ArtifactStore;
use async_trait::async_trait;
use pmcp::types::{Content, ListResourcesResult, ReadResourceResult, ResourceInfo};
use pmcp::{Error, RequestHandlerExtra, ResourceHandler};
use std::sync::Arc;

pub const CONSOLE_LOGS_URI: &str = "console://logs";
pub const SCREENSHOT_SCHEME: &str = "screenshot://";

pub struct BrowserResources {
    artifacts: Arc<ArtifactStore>,
}

impl BrowserResources {
    pub fn new(artifacts: Arc<ArtifactStore>) -> Self {
        Self { artifacts }
    }

    /// Console logs first, then stored screenshots sorted by name.
    pub fn entries(&self) -> Vec<ResourceInfo> {
        let mut resources = vec![ResourceInfo {
            uri: CONSOLE_LOGS_URI.to_string(),
            name: "Browser console logs".to_string(),
            description: None,
            mime_type: Some("text/plain".to_string()),
            meta: None,
        }];

        resources.extend(
            self.artifacts
                .screenshots()
                .into_iter()
                .map(|(name, shot)| ResourceInfo {
                    uri: format!("{}{}", SCREENSHOT_SCHEME, name),
                    name: format!(
                        "Screenshot: {} ({}x{}, taken {})",
                        name,
                        shot.width,
                        shot.height,
                        shot.taken_at.format("%Y-%m-%d %H:%M:%S UTC")
                    ),
                    description: None,
                    mime_type: Some("image/png".to_string()),
                    meta: None,
                }),
        );

        resources
    }

    pub fn contents(&self, uri: &str) -> Result<Content, Error> {
        if uri == CONSOLE_LOGS_URI {
            return Ok(Content::Resource {
                uri: uri.to_string(),
                text: Some(self.artifacts.console_logs().join("\n")),
                mime_type: Some("text/plain".to_string()),
                meta: None,
            });
        }

        let screenshot = uri
            .strip_prefix(SCREENSHOT_SCHEME)
            .and_then(|name| self.artifacts.screenshot(name))
            .ok_or_else(|| Error::not_found(uri))?;

        Ok(Content::Image {
            data: screenshot.data,
            mime_type: "image/png".to_string(),
        })
    }
}

#[async_trait]
impl ResourceHandler for BrowserResources {
    async fn read(
        &self,
        uri: &str,
        _extra: RequestHandlerExtra,
    ) -> pmcp::Result<ReadResourceResult> {
        tracing::debug!(uri, "Reading resource");
        Ok(ReadResourceResult::new(vec![self.contents(uri)?]))
    }

    async fn list(
        &self,
        _cursor: Option<String>,
        _extra: RequestHandlerExtra,
    ) -> pmcp::Result<ListResourcesResult> {
        Ok(ListResourcesResult::new(self.entries()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> (Arc<ArtifactStore>, BrowserResources) {
        let artifacts = Arc::new(ArtifactStore::new());
        (artifacts.clone(), BrowserResources::new(artifacts))
    }

    #[test]
    fn test_list_includes_stored_screenshots() {
        let (artifacts, resources) = provider();
        artifacts.store_screenshot("login", "iVBORw0KGgo=".to_string(), 800, 600);

        let listed = resources.entries();
        let uris: Vec<&str> = listed.iter().map(|r| r.uri.as_str()).collect();

        assert_eq!(uris, vec!["console://logs", "screenshot://login"]);
        assert_eq!(listed[1].mime_type.as_deref(), Some("image/png"));
    }

    #[test]
    fn test_screenshot_listing_shows_size_and_time() {
        let (artifacts, resources) = provider();
        artifacts.store_screenshot("wide", "iVBORw0KGgo=".to_string(), 1920, 1080);
        let taken_at = artifacts.screenshot("wide").unwrap().taken_at;

        let listed = resources.entries();

        assert!(listed[1].name.starts_with("Screenshot: wide (1920x1080, taken "));
        assert!(listed[1]
            .name
            .contains(&taken_at.format("%Y-%m-%d %H:%M:%S").to_string()));
    }

    #[test]
    fn test_read_console_logs() {
        let (artifacts, resources) = provider();
        artifacts.push_console("log", "hello");
        artifacts.push_console("warning", "deprecated API");

        match resources.contents("console://logs").unwrap() {
            Content::Resource { text, mime_type, .. } => {
                assert_eq!(
                    text.as_deref(),
                    Some("[log] hello\n[warning] deprecated API")
                );
                assert_eq!(mime_type.as_deref(), Some("text/plain"));
            }
            other => panic!("expected text resource, got {:?}", other),
        }
    }

    #[test]
    fn test_read_screenshot_image() {
        let (artifacts, resources) = provider();
        artifacts.store_screenshot("cart", "iVBORw0KGgo=".to_string(), 800, 600);

        match resources.contents("screenshot://cart").unwrap() {
            Content::Image { data, mime_type } => {
                assert_eq!(data, "iVBORw0KGgo=");
                assert_eq!(mime_type, "image/png");
            }
            other => panic!("expected image, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_resource_is_not_found() {
        let (_, resources) = provider();

        let err = resources.contents("screenshot://nope").unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert_eq!(err.to_string(), "Resource not found: screenshot://nope");

        let err = resources.contents("file:///etc/passwd").unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }
}
