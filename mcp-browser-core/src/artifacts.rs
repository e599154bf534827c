//! Console output and screenshots captured from the browser.
//!
//! Shared between the tools that produce artifacts and the resource provider
//! that serves them.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

/// One stored screenshot.
#[derive(Debug, Clone)]
pub struct Screenshot {
    /// Base64-encoded PNG
    pub data: String,
    pub width: u32,
    pub height: u32,
    pub taken_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct ArtifactStore {
    console: Mutex<Vec<String>>,
    screenshots: Mutex<BTreeMap<String, Screenshot>>,
}

impl ArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a console message as `[<kind>] <text>`.
    pub fn push_console(&self, kind: &str, text: &str) {
        self.console
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(format!("[{}] {}", kind, text));
    }

    pub fn console_logs(&self) -> Vec<String> {
        self.console
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Store a screenshot, replacing any previous one with the same name.
    pub fn store_screenshot(&self, name: &str, data: String, width: u32, height: u32) {
        let screenshot = Screenshot {
            data,
            width,
            height,
            taken_at: Utc::now(),
        };
        let replaced = self
            .screenshots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), screenshot)
            .is_some();
        tracing::debug!(name, replaced, "Stored screenshot");
    }

    pub fn screenshot(&self, name: &str) -> Option<Screenshot> {
        self.screenshots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Stored screenshots, sorted by name.
    pub fn screenshots(&self) -> Vec<(String, Screenshot)> {
        self.screenshots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(name, shot)| (name.clone(), shot.clone()))
            .collect()
    }
}
