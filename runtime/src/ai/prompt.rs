//! Default analysis prompt.

use super::AiRequest;
use crate::insider::{InsiderSummary, TradeDirection, UNKNOWN_AGE_DAYS};

/// The prompt sent to the provider. A non-blank `custom_prompt` is used
/// verbatim.
pub fn build(request: &AiRequest) -> String {
    if let Some(custom) = request
        .custom_prompt
        .as_deref()
        .filter(|p| !p.trim().is_empty())
    {
        return custom.to_string();
    }

    let ticker = request.ticker.trim().to_uppercase();
    let company = match request.company_name.trim() {
        "" => ticker.clone(),
        name => format!("{name} ({ticker})"),
    };

    let mut lines = vec![
        "You are an equity analyst writing for investors who screen holdings for Shariah compliance."
            .to_string(),
        format!("Give a concise analysis of {company}."),
        String::new(),
        "Cover: business activities and revenue sources relevant to compliance, debt levels, \
         recent news, and what insider trading suggests about management confidence."
            .to_string(),
    ];

    if let Some(data) = &request.insider_data {
        lines.push(String::new());
        lines.push("Insider activity (most recent filings):".to_string());
        match serde_json::from_value::<InsiderSummary>(data.clone()) {
            Ok(s) => lines.extend(summary_lines(&s)),
            Err(_) => lines.push(data.to_string()),
        }
    }

    lines.push(String::new());
    lines.push(if request.with_search {
        "Use current web sources and cite them as markdown links.".to_string()
    } else {
        "Rely on what you know; say so where information may be out of date.".to_string()
    });
    lines.push("Keep the answer under 400 words.".to_string());
    lines.join("\n")
}

fn summary_lines(s: &InsiderSummary) -> Vec<String> {
    let mut lines = vec![
        format!("- Purchases: {} totalling ${:.0}", s.buy_count, s.total_buy),
        format!("- Sales: {} totalling ${:.0}", s.sell_count, s.total_sell),
        format!("- Purchases in the last 30 days: {}", s.recent_activity),
    ];
    for t in &s.recent_trades {
        let age = if t.days_ago >= UNKNOWN_AGE_DAYS {
            "date unknown".to_string()
        } else {
            format!("{} days ago", t.days_ago)
        };
        let direction = match t.direction {
            TradeDirection::Buy => "bought",
            TradeDirection::Sell => "sold",
        };
        lines.push(format!(
            "  - {} ({}) {direction} ${:.0}, {age}",
            t.insider_name, t.title, t.value
        ));
    }
    lines
}
