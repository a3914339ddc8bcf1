//! Runtime configuration resolved from the environment.
//!
//! Every field has a default; `SCREENER_*` variables override them. The CLI
//! applies its flags on top of whatever [`ScreenerConfig::from_env`] returns.

use std::path::PathBuf;

/// Compliance-status page. `{ticker}` is replaced with the upper-cased symbol.
pub const DEFAULT_STATUS_URL: &str = "https://musaffa.com/stock/{ticker}/";

/// Insider-trading table page.
pub const DEFAULT_INSIDER_URL: &str = "http://openinsider.com/screener?s={ticker}";

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4.1-mini";

/// Resolved configuration for a screener instance.
#[derive(Debug, Clone)]
pub struct ScreenerConfig {
    pub status_url_template: String,
    pub insider_url_template: String,
    pub gemini_base_url: String,
    pub gemini_model: String,
    pub openai_base_url: String,
    pub openai_model: String,
    /// Explicit Chromium binary; `None` means auto-discovery.
    pub chromium_path: Option<PathBuf>,
}

impl Default for ScreenerConfig {
    fn default() -> Self {
        Self {
            status_url_template: DEFAULT_STATUS_URL.to_string(),
            insider_url_template: DEFAULT_INSIDER_URL.to_string(),
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            openai_model: DEFAULT_OPENAI_MODEL.to_string(),
            chromium_path: None,
        }
    }
}

impl ScreenerConfig {
    /// Build a configuration from `SCREENER_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        Self {
            status_url_template: get("SCREENER_STATUS_URL", DEFAULT_STATUS_URL),
            insider_url_template: get("SCREENER_INSIDER_URL", DEFAULT_INSIDER_URL),
            gemini_base_url: get("SCREENER_GEMINI_BASE_URL", DEFAULT_GEMINI_BASE_URL),
            gemini_model: get("SCREENER_GEMINI_MODEL", DEFAULT_GEMINI_MODEL),
            openai_base_url: get("SCREENER_OPENAI_BASE_URL", DEFAULT_OPENAI_BASE_URL),
            openai_model: get("SCREENER_OPENAI_MODEL", DEFAULT_OPENAI_MODEL),
            chromium_path: lookup("SCREENER_CHROMIUM_PATH")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
        }
    }
}

/// Read a provider key for CLI use (`GEMINI_API_KEY` / `OPENAI_API_KEY`).
///
/// Requests arriving over REST always carry their own key.
pub fn api_key_from_env(var: &str) -> Option<String> {
    std::env::var(var)
        .ok()
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
}
