//! Insider-trading pipeline: render the trade table and summarize it.

use super::coordinator::{AttemptVerdict, RetryCoordinator, RetryPolicy};
use super::readiness::{PageSnapshot, ReadinessPolicy};
use super::ScrapeRequest;
use crate::error::Result;
use crate::insider::{table, InsiderSummary};
use crate::renderer::Renderer;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// Result contract of `fetchInsiderData`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsiderResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<InsiderSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Clone)]
pub struct InsiderScraper {
    coordinator: RetryCoordinator,
    url_template: String,
    /// Fixed "today" for day arithmetic; the local date when unset.
    reference_date: Option<NaiveDate>,
}

impl InsiderScraper {
    pub fn new(renderer: Arc<dyn Renderer>, url_template: impl Into<String>) -> Self {
        Self::with_policy(renderer, url_template, RetryPolicy::insider())
    }

    pub fn with_policy(
        renderer: Arc<dyn Renderer>,
        url_template: impl Into<String>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            coordinator: RetryCoordinator::new(renderer, policy, ReadinessPolicy::table_page()),
            url_template: url_template.into(),
            reference_date: None,
        }
    }

    /// Compute trade ages relative to `date` instead of the local date.
    pub fn with_reference_date(mut self, date: NaiveDate) -> Self {
        self.reference_date = Some(date);
        self
    }

    pub async fn fetch_insider(&self, ticker: &str) -> InsiderResponse {
        match self.summarize(ticker).await {
            Ok(summary) => InsiderResponse {
                success: true,
                data: Some(summary),
                error: None,
            },
            Err(e) => {
                warn!(ticker, code = e.code(), "insider lookup failed: {e}");
                InsiderResponse {
                    success: false,
                    data: None,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    pub async fn summarize(&self, ticker: &str) -> Result<InsiderSummary> {
        let request = ScrapeRequest::new(ticker, &self.url_template)?;
        let today = self
            .reference_date
            .unwrap_or_else(|| chrono::Local::now().date_naive());

        let outcome = self
            .coordinator
            .run(&request, |snapshot: &PageSnapshot| {
                match table::extract_summary(snapshot.full_html(), today) {
                    Ok(summary) => AttemptVerdict::Accept(summary),
                    Err(e) => AttemptVerdict::RetryOnce(e.to_string()),
                }
            })
            .await?;

        info!(
            ticker = %request.ticker,
            buys = outcome.value.buy_count,
            sells = outcome.value.sell_count,
            attempts = outcome.attempts,
            "insider summary extracted"
        );
        Ok(outcome.value)
    }
}
