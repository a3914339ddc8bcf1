//! The screener service: one handle over both scrapers and the AI gateway.
//!
//! Each call is independent; nothing here is shared between requests except
//! the renderer.

use crate::ai::{AiGateway, AiRequest, AiResponse};
use crate::config::ScreenerConfig;
use crate::protocol::{self, Action};
use crate::renderer::chromium::ChromiumRenderer;
use crate::renderer::{NoopRenderer, Renderer};
use crate::scrape::insider::{InsiderResponse, InsiderScraper};
use crate::scrape::status::{StatusResponse, StatusScraper};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Clone)]
pub struct Screener {
    renderer: Arc<dyn Renderer>,
    status: StatusScraper,
    insider: InsiderScraper,
    ai: AiGateway,
}

impl Screener {
    /// Build a screener over `renderer` with default retry policies.
    pub fn new(renderer: Arc<dyn Renderer>, config: &ScreenerConfig) -> Self {
        Self {
            status: StatusScraper::new(Arc::clone(&renderer), &config.status_url_template),
            insider: InsiderScraper::new(Arc::clone(&renderer), &config.insider_url_template),
            ai: AiGateway::new(config),
            renderer,
        }
    }

    /// Assemble from pre-built parts.
    pub fn from_parts(
        renderer: Arc<dyn Renderer>,
        status: StatusScraper,
        insider: InsiderScraper,
        ai: AiGateway,
    ) -> Self {
        Self {
            renderer,
            status,
            insider,
            ai,
        }
    }

    /// Start headless Chromium, or fall back to AI-only mode when it cannot
    /// be launched.
    pub async fn launch(config: &ScreenerConfig) -> Self {
        let renderer: Arc<dyn Renderer> =
            match ChromiumRenderer::new(config.chromium_path.as_deref()).await {
                Ok(r) => {
                    info!("Chromium renderer started");
                    Arc::new(r)
                }
                Err(e) => {
                    warn!("Chromium unavailable, running in AI-only mode: {e:#}");
                    Arc::new(NoopRenderer)
                }
            };
        Self::new(renderer, config)
    }

    pub async fn fetch_status(&self, ticker: &str) -> StatusResponse {
        self.status.fetch_status(ticker).await
    }

    pub async fn fetch_insider(&self, ticker: &str) -> InsiderResponse {
        self.insider.fetch_insider(ticker).await
    }

    pub async fn analyze(&self, request: &AiRequest) -> AiResponse {
        self.ai.respond(request).await
    }

    /// Run one action to its result contract.
    pub async fn dispatch(&self, action: Action) -> Value {
        info!(action = action.name(), "dispatching");
        match action {
            Action::FetchStatus { ticker } => to_value(self.fetch_status(&ticker).await),
            Action::FetchInsiderData { ticker } => to_value(self.fetch_insider(&ticker).await),
            Action::AiAnalyze(request) => to_value(self.analyze(&request).await),
            Action::AiAnalyzeWithSearch(mut request) => {
                request.with_search = true;
                to_value(self.analyze(&request).await)
            }
        }
    }

    /// Parse then dispatch a raw message. Malformed messages get the failure
    /// contract.
    pub async fn dispatch_message(&self, message: Value) -> Value {
        match protocol::parse_action(message) {
            Ok(action) => self.dispatch(action).await,
            Err(e) => protocol::error_value(&e),
        }
    }

    /// Tabs currently open across all in-flight requests.
    pub fn active_tabs(&self) -> usize {
        self.renderer.active_contexts()
    }

    pub async fn shutdown(&self) {
        if let Err(e) = self.renderer.shutdown().await {
            warn!("renderer shutdown failed: {e:#}");
        }
    }
}

fn to_value<T: Serialize>(response: T) -> Value {
    serde_json::to_value(response).unwrap_or_else(|e| {
        serde_json::json!({ "success": false, "error": format!("failed to encode response: {e}") })
    })
}
