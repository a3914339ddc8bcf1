//! Headless scraping: tab lifecycle, readiness polling, and the retry state
//! machine, plus the two pipelines built on them.

pub mod coordinator;
pub mod insider;
pub mod readiness;
pub mod status;
pub mod surrogate;

use crate::error::{Result, ScreenError};
use serde::Serialize;

/// Longest accepted ticker symbol.
const MAX_TICKER_LEN: usize = 12;

/// One inbound scrape: a normalized ticker and the page to render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeRequest {
    pub ticker: String,
    pub target_url: String,
}

impl ScrapeRequest {
    /// Normalize `ticker` and expand `{ticker}` in `url_template`.
    pub fn new(ticker: &str, url_template: &str) -> Result<Self> {
        let ticker = normalize_ticker(ticker)?;
        let encoded: String = url::form_urlencoded::byte_serialize(ticker.as_bytes()).collect();
        let target_url = url_template.replace("{ticker}", &encoded);
        url::Url::parse(&target_url)
            .map_err(|e| ScreenError::Configuration(format!("bad target URL {target_url}: {e}")))?;
        Ok(Self { ticker, target_url })
    }
}

/// Upper-case and validate a ticker symbol (`BRK.B`, `RDS-A`, `AAPL`).
pub fn normalize_ticker(raw: &str) -> Result<String> {
    let ticker = raw.trim().to_ascii_uppercase();
    if ticker.is_empty() {
        return Err(ScreenError::InvalidInput("ticker is empty".into()));
    }
    if ticker.len() > MAX_TICKER_LEN
        || !ticker
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | ':'))
    {
        return Err(ScreenError::InvalidInput(format!("invalid ticker: {raw:?}")));
    }
    Ok(ticker)
}
