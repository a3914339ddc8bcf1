//! Insider-trading summaries from a rendered trade table.
//!
//! Parsing is deliberately forgiving: unreadable values count as zero,
//! unreadable dates count as old, and rows that are neither purchases nor
//! sales are skipped. Only a missing table is an error.

pub mod table;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Rows beyond this are ignored.
pub const MAX_ROWS: usize = 50;
/// Size of the shared `recent_trades` sample.
pub const RECENT_TRADE_SAMPLE: usize = 5;
/// Purchases at most this old count as recent activity.
pub const RECENT_WINDOW_DAYS: i64 = 30;
/// Age assigned to rows whose date cannot be read.
pub const UNKNOWN_AGE_DAYS: i64 = 9999;

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%m/%d/%y", "%b %d, %Y", "%b %d %Y", "%d %b %Y"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeDirection {
    Buy,
    Sell,
}

/// One classified trade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsiderTrade {
    #[serde(rename = "type")]
    pub direction: TradeDirection,
    pub value: f64,
    pub insider_name: String,
    pub title: String,
    pub days_ago: i64,
}

/// Aggregate over the first [`MAX_ROWS`] rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsiderSummary {
    pub total_buy: f64,
    pub total_sell: f64,
    pub buy_count: u32,
    pub sell_count: u32,
    /// Purchases within [`RECENT_WINDOW_DAYS`].
    pub recent_activity: u32,
    pub recent_trades: Vec<InsiderTrade>,
}

/// Cell text of one table row, by column meaning.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRow {
    pub insider_name: String,
    pub title: String,
    pub trade_type: String,
    pub trade_date: String,
    pub value: String,
}

/// Parse a money cell: `"+$1,234,567"` → `1234567.0`. Never fails.
pub fn parse_value(raw: &str) -> f64 {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    cleaned
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .map(f64::abs)
        .unwrap_or(0.0)
}

/// Days between a trade date cell and `today`; [`UNKNOWN_AGE_DAYS`] if unreadable.
pub fn days_since(raw: &str, today: NaiveDate) -> i64 {
    let trimmed = raw.trim();
    // "2024-03-01 16:05:12" → date part only
    let date_part = trimmed.split_whitespace().next().unwrap_or_default();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| {
            NaiveDate::parse_from_str(trimmed, fmt)
                .or_else(|_| NaiveDate::parse_from_str(date_part, fmt))
                .ok()
        })
        .map(|d| (today - d).num_days().max(0))
        .unwrap_or(UNKNOWN_AGE_DAYS)
}

/// Purchase or sale from a transaction-type cell (`"P - Purchase"`, `"S - Sale+OE"`).
pub fn classify_direction(raw: &str) -> Option<TradeDirection> {
    let upper = raw.trim().to_ascii_uppercase();
    let code = upper
        .split(|c: char| c == '-' || c.is_whitespace())
        .next()
        .unwrap_or_default();
    match code {
        "P" => return Some(TradeDirection::Buy),
        "S" => return Some(TradeDirection::Sell),
        _ => {}
    }
    if upper.contains("PURCHASE") || upper.contains("BUY") {
        Some(TradeDirection::Buy)
    } else if upper.contains("SALE") || upper.contains("SELL") || upper.contains("SOLD") {
        Some(TradeDirection::Sell)
    } else {
        None
    }
}

/// Aggregate rows into a summary.
pub fn summarize(rows: &[RawRow], today: NaiveDate) -> InsiderSummary {
    let mut summary = InsiderSummary::default();

    for row in rows.iter().take(MAX_ROWS) {
        let Some(direction) = classify_direction(&row.trade_type) else {
            continue;
        };
        let value = parse_value(&row.value);
        let days_ago = days_since(&row.trade_date, today);

        match direction {
            TradeDirection::Buy => {
                summary.total_buy += value;
                summary.buy_count += 1;
                if days_ago <= RECENT_WINDOW_DAYS {
                    summary.recent_activity += 1;
                }
            }
            TradeDirection::Sell => {
                summary.total_sell += value;
                summary.sell_count += 1;
            }
        }

        if summary.recent_trades.len() < RECENT_TRADE_SAMPLE {
            summary.recent_trades.push(InsiderTrade {
                direction,
                value,
                insider_name: row.insider_name.trim().to_string(),
                title: row.title.trim().to_string(),
                days_ago,
            });
        }
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
    }

    fn row(trade_type: &str, value: &str, date: &str) -> RawRow {
        RawRow {
            insider_name: "Cook Timothy D".into(),
            title: "CEO".into(),
            trade_type: trade_type.into(),
            trade_date: date.into(),
            value: value.into(),
        }
    }

    #[test]
    fn test_purchase_row_counts() {
        let s = summarize(&[row("P - Purchase", "$12,345", "2026-10-10")], today());
        assert_eq!(s.total_buy, 12345.0);
        assert_eq!(s.buy_count, 1);
        assert_eq!(s.recent_activity, 1);
        assert_eq!(s.recent_trades[0].days_ago, 8);
        assert_eq!(s.recent_trades[0].direction, TradeDirection::Buy);
    }

    #[test]
    fn test_unparseable_value_is_zero() {
        let s = summarize(&[row("S - Sale", "n/a", "2026-10-10")], today());
        assert_eq!(s.total_sell, 0.0);
        assert_eq!(s.sell_count, 1);
    }

    #[test]
    fn test_parse_value_variants() {
        assert_eq!(parse_value("+$1,234,567"), 1_234_567.0);
        assert_eq!(parse_value("-$98,000"), 98_000.0);
        assert_eq!(parse_value("$1,000.50"), 1000.5);
        assert_eq!(parse_value(""), 0.0);
        assert_eq!(parse_value("--"), 0.0);
    }

    #[test]
    fn test_days_since_formats() {
        assert_eq!(days_since("2026-10-18", today()), 0);
        assert_eq!(days_since("2026-09-18 16:30:01", today()), 30);
        assert_eq!(days_since("10/01/2026", today()), 17);
        assert_eq!(days_since("Oct 8, 2026", today()), 10);
        assert_eq!(days_since("yesterday", today()), UNKNOWN_AGE_DAYS);
        // future dates clamp to zero
        assert_eq!(days_since("2026-12-01", today()), 0);
    }

    #[test]
    fn test_classify_direction() {
        assert_eq!(classify_direction("P - Purchase"), Some(TradeDirection::Buy));
        assert_eq!(classify_direction("S - Sale+OE"), Some(TradeDirection::Sell));
        assert_eq!(classify_direction("Buy"), Some(TradeDirection::Buy));
        assert_eq!(classify_direction("Sold"), Some(TradeDirection::Sell));
        assert_eq!(classify_direction("M - OptEx"), None);
        assert_eq!(classify_direction("G - Gift"), None);
        assert_eq!(classify_direction(""), None);
    }

    #[test]
    fn test_row_cap_and_sample_cap() {
        let rows: Vec<RawRow> = (0..60)
            .map(|_| row("P - Purchase", "$100", "2026-10-01"))
            .collect();
        let s = summarize(&rows, today());
        assert_eq!(s.buy_count, 50);
        assert_eq!(s.total_buy, 5000.0);
        assert_eq!(s.recent_trades.len(), 5);
    }

    #[test]
    fn test_sample_is_first_come_across_directions() {
        let rows = vec![
            row("S - Sale", "$10", "2026-10-01"),
            row("M - OptEx", "$999", "2026-10-01"),
            row("P - Purchase", "$5", "bad date"),
        ];
        let s = summarize(&rows, today());
        assert_eq!(s.recent_trades.len(), 2);
        assert_eq!(s.recent_trades[0].direction, TradeDirection::Sell);
        assert_eq!(s.recent_trades[1].days_ago, UNKNOWN_AGE_DAYS);
        assert_eq!(s.recent_activity, 0);
    }

    #[test]
    fn test_summary_serializes_camel_case() {
        let s = summarize(&[row("P - Purchase", "$1", "2026-10-18")], today());
        let v = serde_json::to_value(&s).unwrap();
        assert_eq!(v["buyCount"], 1);
        assert_eq!(v["recentTrades"][0]["type"], "buy");
        assert_eq!(v["recentTrades"][0]["insiderName"], "Cook Timothy D");
    }
}
