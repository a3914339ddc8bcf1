//! Compliance-status pipeline: render, classify, retry, reparse.

use super::coordinator::{AttemptVerdict, RetryCoordinator, RetryPolicy};
use super::readiness::{PageSnapshot, ReadinessPolicy};
use super::ScrapeRequest;
use crate::classifier::{self, ClassificationResult, ClassifierInput, ComplianceStatus};
use crate::error::{Result, ScreenError};
use crate::renderer::Renderer;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Diagnostics attached to every status response. Counters are zero when
/// the request failed before or during scraping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusDebug {
    pub ticker: String,
    pub url: String,
    pub attempts: u32,
    pub retries: u32,
    pub fallback_used: bool,
    pub waited_ms: u64,
    pub content_found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
}

/// Result contract of `fetchStatus`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub success: bool,
    pub status: ComplianceStatus,
    pub reason: String,
    pub debug: StatusDebug,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StatusResponse {
    fn failed(debug: StatusDebug, err: &ScreenError) -> Self {
        Self {
            success: false,
            status: ComplianceStatus::Error,
            reason: err.to_string(),
            debug,
            error: Some(err.to_string()),
        }
    }
}

/// A terminal classification plus how it was reached.
#[derive(Debug, Clone)]
pub struct StatusResolution {
    pub result: ClassificationResult,
    pub snapshot: PageSnapshot,
    pub attempts: u32,
    pub retries: u32,
    pub fallback_used: bool,
}

/// Resolves tickers to compliance verdicts.
#[derive(Clone)]
pub struct StatusScraper {
    coordinator: RetryCoordinator,
    url_template: String,
}

impl StatusScraper {
    pub fn new(renderer: Arc<dyn Renderer>, url_template: impl Into<String>) -> Self {
        Self::with_policy(renderer, url_template, RetryPolicy::status())
    }

    pub fn with_policy(
        renderer: Arc<dyn Renderer>,
        url_template: impl Into<String>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            coordinator: RetryCoordinator::new(renderer, policy, ReadinessPolicy::status_page()),
            url_template: url_template.into(),
        }
    }

    /// Resolve `ticker` into the response contract. Never fails: errors are
    /// folded into `success: false`.
    pub async fn fetch_status(&self, ticker: &str) -> StatusResponse {
        let request = match ScrapeRequest::new(ticker, &self.url_template) {
            Ok(request) => request,
            Err(e) => {
                let debug = StatusDebug {
                    ticker: ticker.trim().to_string(),
                    ..StatusDebug::default()
                };
                return StatusResponse::failed(debug, &e);
            }
        };

        match self.resolve(&request).await {
            Ok(resolution) => {
                info!(
                    ticker = %request.ticker,
                    status = %resolution.result.status,
                    fallback = resolution.fallback_used,
                    "status resolved"
                );
                StatusResponse {
                    success: true,
                    status: resolution.result.status,
                    reason: resolution.result.reason,
                    debug: StatusDebug {
                        ticker: request.ticker,
                        url: request.target_url,
                        attempts: resolution.attempts,
                        retries: resolution.retries,
                        fallback_used: resolution.fallback_used,
                        waited_ms: resolution.snapshot.waited_ms,
                        content_found: resolution.snapshot.content_found,
                        snippet: resolution.result.debug_info,
                    },
                    error: None,
                }
            }
            Err(e) => {
                warn!(ticker = %request.ticker, code = e.code(), "status lookup failed: {e}");
                let debug = StatusDebug {
                    ticker: request.ticker,
                    url: request.target_url,
                    ..StatusDebug::default()
                };
                StatusResponse::failed(debug, &e)
            }
        }
    }

    /// Drive attempts to a final verdict. An UNKNOWN terminal gets one
    /// reparse of the full document; if that is still not final the verdict
    /// is DOUBTFUL.
    pub async fn resolve(&self, request: &ScrapeRequest) -> Result<StatusResolution> {
        let outcome = self.coordinator.run(request, interpret_snapshot).await?;

        let mut result = outcome.value;
        let mut fallback_used = false;

        if result.status == ComplianceStatus::Unknown {
            fallback_used = true;
            let reparsed = classifier::reparse_document(outcome.snapshot.full_html());
            debug!(ticker = %request.ticker, status = %reparsed.status, "fallback reparse");
            result = if reparsed.status.is_final() {
                reparsed
            } else {
                ClassificationResult {
                    status: ComplianceStatus::Doubtful,
                    reason: "No verdict found after full-document reparse; treating as doubtful"
                        .to_string(),
                    debug_info: result.debug_info,
                }
            };
        }

        Ok(StatusResolution {
            result,
            snapshot: outcome.snapshot,
            attempts: outcome.attempts,
            retries: outcome.retries,
            fallback_used,
        })
    }
}

fn interpret_snapshot(snapshot: &PageSnapshot) -> AttemptVerdict<ClassificationResult> {
    let result = classifier::classify(&ClassifierInput::from_parts(
        &snapshot.body_text,
        &snapshot.body_html,
    ));
    debug!(
        status = %result.status,
        content_found = snapshot.content_found,
        waited_ms = snapshot.waited_ms,
        "snapshot classified"
    );
    match result.status {
        ComplianceStatus::Error => AttemptVerdict::Retry(result.reason),
        _ => AttemptVerdict::Accept(result),
    }
}
