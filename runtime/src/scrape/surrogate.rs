//! Off-screen tab lifecycle.
//!
//! A [`TabSurrogate`] owns exactly one tab. `close` is idempotent, and a
//! surrogate dropped while still open (e.g. its request task was cancelled)
//! hands the tab to the runtime to be closed in the background, so no path
//! leaks a tab.

use crate::renderer::{NavigationResult, RenderContext, Renderer};
use anyhow::{anyhow, Result};
use serde_json::Value;
use tracing::{debug, warn};

/// A single off-screen tab that is removed exactly once.
pub struct TabSurrogate {
    id: String,
    context: Option<Box<dyn RenderContext>>,
}

impl TabSurrogate {
    /// Open a blank tab.
    pub async fn open(renderer: &dyn Renderer) -> Result<Self> {
        let context = renderer.new_context().await?;
        let id = format!("tab-{}", &uuid::Uuid::new_v4().simple().to_string()[..8]);
        debug!(tab = %id, "surrogate opened");
        Ok(Self {
            id,
            context: Some(context),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_open(&self) -> bool {
        self.context.is_some()
    }

    pub async fn navigate(&mut self, url: &str, timeout_ms: u64) -> Result<NavigationResult> {
        let ctx = self
            .context
            .as_mut()
            .ok_or_else(|| anyhow!("tab {} already closed", self.id))?;
        ctx.navigate(url, timeout_ms).await
    }

    pub async fn evaluate(&self, script: &str) -> Result<Value> {
        let ctx = self
            .context
            .as_ref()
            .ok_or_else(|| anyhow!("tab {} already closed", self.id))?;
        ctx.execute_js(script).await
    }

    /// Remove the tab. Safe to call repeatedly; only the first call acts.
    pub async fn close(&mut self) {
        if let Some(ctx) = self.context.take() {
            if let Err(e) = ctx.close().await {
                warn!(tab = %self.id, "failed to close tab: {e:#}");
            }
            debug!(tab = %self.id, "surrogate closed");
        }
    }
}

impl Drop for TabSurrogate {
    fn drop(&mut self) {
        if let Some(ctx) = self.context.take() {
            match tokio::runtime::Handle::try_current() {
                Ok(handle) => {
                    let id = self.id.clone();
                    handle.spawn(async move {
                        if let Err(e) = ctx.close().await {
                            warn!(tab = %id, "failed to close dropped tab: {e:#}");
                        }
                    });
                }
                Err(_) => warn!(tab = %self.id, "tab dropped outside a runtime; not closed"),
            }
        }
    }
}
