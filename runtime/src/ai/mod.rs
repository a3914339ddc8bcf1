//! AI analysis gateway.
//!
//! Two providers with different request formats and response envelopes sit
//! behind one contract: [`AiGateway::analyze`] takes an [`AiRequest`] and
//! yields an [`AiResult`] with the analysis text, whether it was grounded in
//! web search, and a deduplicated, bounded list of sources.

pub mod citations;
pub mod envelope;
pub mod gemini;
pub mod openai;
pub mod prompt;

use crate::config::ScreenerConfig;
use crate::error::{Result, ScreenError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{info, warn};

pub use gemini::GeminiClient;
pub use openai::OpenAiClient;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    Gemini,
    OpenAi,
}

impl Provider {
    pub fn as_str(self) -> &'static str {
        match self {
            Provider::Gemini => "gemini",
            Provider::OpenAi => "openai",
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Provider {
    type Err = ScreenError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" | "google" => Ok(Provider::Gemini),
            "openai" | "gpt" => Ok(Provider::OpenAi),
            other => Err(ScreenError::InvalidInput(format!("unknown provider: {other}"))),
        }
    }
}

/// An analysis request. The key travels with the request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiRequest {
    pub ticker: String,
    #[serde(default)]
    pub company_name: String,
    /// Usually an insider summary; any JSON is accepted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insider_data: Option<Value>,
    #[serde(default)]
    pub provider: Provider,
    #[serde(default)]
    pub with_search: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_prompt: Option<String>,
    #[serde(default, skip_serializing)]
    pub api_key: String,
}

/// A cited web page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub title: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiResult {
    pub success: bool,
    pub analysis: String,
    pub grounded: bool,
    pub sources: Vec<Source>,
}

/// Result contract of `aiAnalyze`: an [`AiResult`] or `{success: false, error}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grounded: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<Source>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<Result<AiResult>> for AiResponse {
    fn from(result: Result<AiResult>) -> Self {
        match result {
            Ok(r) => Self {
                success: r.success,
                analysis: Some(r.analysis),
                grounded: Some(r.grounded),
                sources: Some(r.sources),
                error: None,
            },
            Err(e) => Self {
                success: false,
                analysis: None,
                grounded: None,
                sources: None,
                error: Some(e.to_string()),
            },
        }
    }
}

/// Dispatches analysis requests to the selected provider.
#[derive(Clone)]
pub struct AiGateway {
    gemini: GeminiClient,
    openai: OpenAiClient,
}

impl AiGateway {
    pub fn new(config: &ScreenerConfig) -> Self {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(15))
            .user_agent(concat!("screener/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();
        Self {
            gemini: GeminiClient::new(http.clone(), &config.gemini_base_url, &config.gemini_model),
            openai: OpenAiClient::new(http, &config.openai_base_url, &config.openai_model),
        }
    }

    /// Override the provider-B race bounds (search, plain).
    pub fn with_openai_race(mut self, search: Duration, plain: Duration) -> Self {
        self.openai = self.openai.with_race_timeouts(search, plain);
        self
    }

    pub async fn analyze(&self, request: &AiRequest) -> Result<AiResult> {
        let api_key = request.api_key.trim();
        if api_key.is_empty() {
            return Err(ScreenError::Configuration(format!(
                "no API key provided for {}",
                request.provider
            )));
        }
        if request.ticker.trim().is_empty() && request.custom_prompt.is_none() {
            return Err(ScreenError::InvalidInput("ticker is empty".into()));
        }

        let prompt = prompt::build(request);
        info!(
            ticker = %request.ticker,
            provider = %request.provider,
            with_search = request.with_search,
            "AI analysis requested"
        );

        let result = match request.provider {
            Provider::Gemini => {
                self.gemini
                    .generate(&prompt, api_key, request.with_search)
                    .await
            }
            Provider::OpenAi => {
                self.openai
                    .generate(&prompt, api_key, request.with_search)
                    .await
            }
        };

        match &result {
            Ok(r) => info!(
                provider = %request.provider,
                grounded = r.grounded,
                sources = r.sources.len(),
                "AI analysis complete"
            ),
            Err(e) => warn!(provider = %request.provider, code = e.code(), "AI analysis failed: {e}"),
        }
        result
    }

    /// [`analyze`](Self::analyze) folded into the response contract.
    pub async fn respond(&self, request: &AiRequest) -> AiResponse {
        self.analyze(request).await.into()
    }
}

/// Provider error message from a non-2xx body, if it has the usual shape.
pub(crate) fn provider_error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.pointer("/error/message")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| crate::classifier::truncate_chars(body.trim(), 200))
}
