//! `screener insider <TICKER>`: summarize recent insider trades.

use super::output;
use crate::config::ScreenerConfig;
use crate::insider::{InsiderSummary, TradeDirection, UNKNOWN_AGE_DAYS};
use crate::service::Screener;
use anyhow::{anyhow, Result};

pub async fn run(ticker: &str, config: &ScreenerConfig) -> Result<()> {
    let screener = Screener::launch(config).await;
    let resp = screener.fetch_insider(ticker).await;
    screener.shutdown().await;

    if output::is_json() {
        output::print_json(&resp);
        if !resp.success {
            std::process::exit(1);
        }
        return Ok(());
    }
    let summary = match (resp.success, resp.data) {
        (true, Some(summary)) => summary,
        _ => return Err(anyhow!(resp.error.unwrap_or_else(|| "no data".into()))),
    };
    print_summary(&ticker.trim().to_uppercase(), &summary);
    Ok(())
}

fn print_summary(ticker: &str, s: &InsiderSummary) {
    println!("Insider activity for {ticker}");
    println!("  Buys:   {:>3}  {}", s.buy_count, output::money(s.total_buy));
    println!("  Sells:  {:>3}  {}", s.sell_count, output::money(s.total_sell));
    println!("  Buys in last 30 days: {}", s.recent_activity);
    if s.recent_trades.is_empty() || output::is_quiet() {
        return;
    }
    println!();
    for t in &s.recent_trades {
        let side = match t.direction {
            TradeDirection::Buy => "BUY ",
            TradeDirection::Sell => "SELL",
        };
        let age = if t.days_ago >= UNKNOWN_AGE_DAYS {
            "?".to_string()
        } else {
            format!("{}d", t.days_ago)
        };
        println!(
            "  {side} {:>14}  {:>5}  {} ({})",
            output::money(t.value),
            age,
            t.insider_name,
            t.title
        );
    }
}
