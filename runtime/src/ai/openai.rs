//! Provider B: the Responses API, raced against a fixed bound.

use super::{citations, envelope, provider_error_message, AiResult};
use crate::error::{Result, ScreenError};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};

/// Source cap for this provider.
pub const MAX_SOURCES: usize = 5;

pub const SEARCH_RACE: Duration = Duration::from_millis(120_000);
pub const PLAIN_RACE: Duration = Duration::from_millis(65_000);

const SEARCH_MAX_TOKENS: u32 = 4096;
const PLAIN_MAX_TOKENS: u32 = 2048;

#[derive(Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    search_race: Duration,
    plain_race: Duration,
}

impl OpenAiClient {
    pub fn new(http: reqwest::Client, base_url: &str, model: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            search_race: SEARCH_RACE,
            plain_race: PLAIN_RACE,
        }
    }

    pub fn with_race_timeouts(mut self, search: Duration, plain: Duration) -> Self {
        self.search_race = search;
        self.plain_race = plain;
        self
    }

    pub fn endpoint(&self) -> String {
        format!("{}/responses", self.base_url)
    }

    pub fn build_payload(&self, prompt: &str, with_search: bool) -> Value {
        let mut payload = json!({
            "model": self.model,
            "input": prompt,
            "max_output_tokens": if with_search { SEARCH_MAX_TOKENS } else { PLAIN_MAX_TOKENS },
        });
        if with_search {
            payload["tools"] = json!([{ "type": "web_search_preview" }]);
        }
        payload
    }

    /// Race the call against the bound for this mode. The losing HTTP future
    /// is dropped, which cancels the request.
    pub async fn generate(&self, prompt: &str, api_key: &str, with_search: bool) -> Result<AiResult> {
        let bound = if with_search {
            self.search_race
        } else {
            self.plain_race
        };
        match tokio::time::timeout(bound, self.call(prompt, api_key, with_search)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(bound_ms = bound.as_millis() as u64, "OpenAI call lost the race");
                Err(ScreenError::Timeout {
                    ms: bound.as_millis() as u64,
                    context: "OpenAI response".into(),
                })
            }
        }
    }

    async fn call(&self, prompt: &str, api_key: &str, with_search: bool) -> Result<AiResult> {
        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(api_key)
            .json(&self.build_payload(prompt, with_search))
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(ScreenError::Network(format!(
                "OpenAI API returned HTTP {}: {}",
                status.as_u16(),
                provider_error_message(&text)
            )));
        }
        let body: Value = serde_json::from_str(&text)
            .map_err(|e| ScreenError::ResponseShape(format!("OpenAI response is not JSON: {e}")))?;

        let analysis = envelope::normalize(&body)?;
        let structured = citations::from_output_items(&body);
        let searched = body
            .get("output")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .any(|i| i.get("type").and_then(Value::as_str) == Some("web_search_call"))
            })
            .unwrap_or(false);
        let sources = citations::merge(structured, citations::inline_links(&analysis), MAX_SOURCES);
        debug!(sources = sources.len(), searched, "OpenAI response normalized");

        Ok(AiResult {
            success: true,
            grounded: with_search && (searched || !sources.is_empty()),
            analysis,
            sources,
        })
    }
}
