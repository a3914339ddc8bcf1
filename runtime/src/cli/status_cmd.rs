//! `screener status <TICKER>`: resolve a compliance verdict.

use super::output;
use crate::config::ScreenerConfig;
use crate::service::Screener;
use anyhow::{bail, Result};

pub async fn run(ticker: &str, config: &ScreenerConfig) -> Result<()> {
    let screener = Screener::launch(config).await;
    let resp = screener.fetch_status(ticker).await;
    screener.shutdown().await;

    if output::is_json() {
        output::print_json(&resp);
        if !resp.success {
            std::process::exit(1);
        }
        return Ok(());
    }
    if resp.success {
        println!("{} {}: {}", output::badge(resp.status), resp.debug.ticker, resp.status);
        if !output::is_quiet() {
            println!("  Reason:   {}", resp.reason);
            println!(
                "  Attempts: {} (retries {}, fallback {})",
                resp.debug.attempts,
                resp.debug.retries,
                if resp.debug.fallback_used { "yes" } else { "no" }
            );
            println!("  Source:   {}", resp.debug.url);
        }
    }

    if !resp.success {
        bail!(resp.error.unwrap_or(resp.reason));
    }
    Ok(())
}
