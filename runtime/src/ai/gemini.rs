//! Provider A: `models/{model}:generateContent`.

use super::{citations, envelope, provider_error_message, AiResult};
use crate::error::{Result, ScreenError};
use serde_json::{json, Value};
use tracing::debug;

/// Source cap for this provider.
pub const MAX_SOURCES: usize = 15;

const SEARCH_MAX_TOKENS: u32 = 8192;
const SEARCH_TEMPERATURE: f64 = 0.7;
const PLAIN_MAX_TOKENS: u32 = 2048;
const PLAIN_TEMPERATURE: f64 = 0.4;

const HARM_CATEGORIES: &[&str] = &[
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
}

impl GeminiClient {
    pub fn new(http: reqwest::Client, base_url: &str, model: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    /// Search mode enables the search tool with the larger budget. Plain mode
    /// uses the smaller budget and relaxes safety filtering; it carries no
    /// tool fields at all.
    pub fn build_payload(prompt: &str, with_search: bool) -> Value {
        let contents = json!([{ "role": "user", "parts": [{ "text": prompt }] }]);
        if with_search {
            json!({
                "contents": contents,
                "tools": [{ "google_search": {} }],
                "generationConfig": {
                    "temperature": SEARCH_TEMPERATURE,
                    "maxOutputTokens": SEARCH_MAX_TOKENS,
                },
            })
        } else {
            let safety: Vec<Value> = HARM_CATEGORIES
                .iter()
                .map(|c| json!({ "category": c, "threshold": "BLOCK_NONE" }))
                .collect();
            json!({
                "contents": contents,
                "generationConfig": {
                    "temperature": PLAIN_TEMPERATURE,
                    "maxOutputTokens": PLAIN_MAX_TOKENS,
                },
                "safetySettings": safety,
            })
        }
    }

    pub async fn generate(&self, prompt: &str, api_key: &str, with_search: bool) -> Result<AiResult> {
        let payload = Self::build_payload(prompt, with_search);
        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(ScreenError::Network(format!(
                "Gemini API returned HTTP {}: {}",
                status.as_u16(),
                provider_error_message(&text)
            )));
        }
        let body: Value = serde_json::from_str(&text)
            .map_err(|e| ScreenError::ResponseShape(format!("Gemini response is not JSON: {e}")))?;

        if let Some(reason) = body.pointer("/promptFeedback/blockReason").and_then(Value::as_str) {
            if body.get("candidates").is_none() {
                return Err(ScreenError::ResponseShape(format!(
                    "Gemini blocked the prompt ({reason})"
                )));
            }
        }

        let analysis = envelope::normalize(&body)?;
        let structured = citations::from_grounding(&body);
        let has_metadata = body.pointer("/candidates/0/groundingMetadata").is_some();
        let sources = citations::merge(structured, citations::inline_links(&analysis), MAX_SOURCES);
        debug!(sources = sources.len(), has_metadata, "Gemini response normalized");

        Ok(AiResult {
            success: true,
            grounded: with_search && (has_metadata || !sources.is_empty()),
            analysis,
            sources,
        })
    }
}
