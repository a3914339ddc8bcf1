//! Renderer abstraction for off-screen page rendering.
//!
//! `Renderer` hands out tabs, `RenderContext` is one tab. The scrape layer
//! only ever talks to these traits, so the headless Chromium backend and the
//! scripted test backend are interchangeable.

pub mod chromium;
#[cfg(any(test, feature = "testkit"))]
pub mod scripted;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Result of navigating a tab to a URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigationResult {
    /// The final URL after any redirects.
    pub final_url: String,
    /// Time taken to load the page in milliseconds.
    pub load_time_ms: u64,
}

/// A browser engine that can open tabs.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Open a new blank tab.
    async fn new_context(&self) -> Result<Box<dyn RenderContext>>;
    /// Shut down the browser engine.
    async fn shutdown(&self) -> Result<()>;
    /// Number of tabs currently open.
    fn active_contexts(&self) -> usize;
}

/// A single tab.
#[async_trait]
pub trait RenderContext: Send + Sync {
    /// Navigate to a URL with a timeout.
    async fn navigate(&mut self, url: &str, timeout_ms: u64) -> Result<NavigationResult>;
    /// Evaluate a script in the page, awaiting a returned promise.
    async fn execute_js(&self, script: &str) -> Result<serde_json::Value>;
    /// Close this tab.
    async fn close(self: Box<Self>) -> Result<()>;
}

/// Renderer used when Chromium is unavailable.
///
/// AI analysis does not need a browser, so `screener serve` still starts;
/// status and insider requests fail with a script error instead.
pub struct NoopRenderer;

#[async_trait]
impl Renderer for NoopRenderer {
    async fn new_context(&self) -> Result<Box<dyn RenderContext>> {
        Err(anyhow::anyhow!("Browser not available (AI-only mode)"))
    }
    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }
    fn active_contexts(&self) -> usize {
        0
    }
}
