//! `screener analyze <TICKER>`: AI analysis, optionally grounded in search.

use super::output;
use crate::ai::{AiRequest, Provider};
use crate::config::{self, ScreenerConfig};
use crate::service::Screener;
use anyhow::{anyhow, bail, Result};

pub struct AnalyzeArgs {
    pub ticker: String,
    pub company: Option<String>,
    pub provider: Provider,
    pub search: bool,
    pub prompt: Option<String>,
    pub api_key: Option<String>,
    /// Scrape insider activity first and include it in the prompt.
    pub with_insider: bool,
}

/// Environment variable holding the key for `provider`.
pub fn key_env(provider: Provider) -> &'static str {
    match provider {
        Provider::Gemini => "GEMINI_API_KEY",
        Provider::OpenAi => "OPENAI_API_KEY",
    }
}

pub async fn run(args: AnalyzeArgs, config: &ScreenerConfig) -> Result<()> {
    let api_key = args
        .api_key
        .or_else(|| config::api_key_from_env(key_env(args.provider)))
        .ok_or_else(|| {
            anyhow!(
                "no API key: pass --api-key or set {}",
                key_env(args.provider)
            )
        })?;

    let screener = Screener::launch(config).await;

    let insider_data = if args.with_insider {
        let resp = screener.fetch_insider(&args.ticker).await;
        match resp.data {
            Some(summary) => Some(serde_json::to_value(summary)?),
            None => {
                tracing::warn!(
                    "insider data unavailable, continuing without it: {}",
                    resp.error.unwrap_or_default()
                );
                None
            }
        }
    } else {
        None
    };

    let request = AiRequest {
        ticker: args.ticker.trim().to_uppercase(),
        company_name: args.company.unwrap_or_default(),
        insider_data,
        provider: args.provider,
        with_search: args.search,
        custom_prompt: args.prompt,
        api_key,
    };
    let resp = screener.analyze(&request).await;
    screener.shutdown().await;

    if output::is_json() {
        output::print_json(&resp);
        if !resp.success {
            std::process::exit(1);
        }
        return Ok(());
    }
    if resp.success {
        println!("{}", resp.analysis.as_deref().unwrap_or_default());
        let sources = resp.sources.as_deref().unwrap_or_default();
        if !sources.is_empty() && !output::is_quiet() {
            println!();
            println!("Sources:");
            for (i, s) in sources.iter().enumerate() {
                println!("  [{}] {} - {}", i + 1, s.title, s.url);
            }
        }
    }

    if !resp.success {
        bail!(resp.error.unwrap_or_else(|| "analysis failed".into()));
    }
    Ok(())
}
