//! Header-driven reading of the rendered trade table.
//!
//! Columns are located by header text rather than position, so a reordered
//! or widened table still reads correctly. `scraper::Html` is `!Send`; keep
//! everything here synchronous.

use super::{summarize, InsiderSummary, RawRow, MAX_ROWS};
use crate::classifier::markers::collapse_whitespace;
use crate::error::{Result, ScreenError};
use chrono::NaiveDate;
use scraper::{ElementRef, Html, Selector};

/// Preferred tables first; any table is a fallback.
const TABLE_SELECTORS: &[&str] = &["table.tinytable", "table"];

/// Column positions resolved from a header row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ColumnMap {
    insider_name: Option<usize>,
    title: Option<usize>,
    trade_type: usize,
    trade_date: Option<usize>,
    value: Option<usize>,
}

impl ColumnMap {
    fn from_headers(headers: &[String]) -> Option<Self> {
        let trade_type = locate(headers, &["trade type", "transaction type", "transaction", "type"])?;
        Some(Self {
            insider_name: locate(headers, &["insider name", "insider", "name", "reporting owner"]),
            title: locate(headers, &["title", "relationship", "position"]),
            trade_type,
            trade_date: locate(headers, &["trade date", "transaction date", "date"]),
            value: locate(headers, &["value", "amount", "total"]),
        })
    }
}

/// First header matching the earliest candidate: exact match beats substring.
fn locate(headers: &[String], candidates: &[&str]) -> Option<usize> {
    candidates.iter().find_map(|want| {
        headers
            .iter()
            .position(|h| h == want)
            .or_else(|| headers.iter().position(|h| h.contains(want)))
    })
}

fn header_key(raw: &str) -> String {
    collapse_whitespace(raw).to_lowercase()
}

fn cell_text(el: ElementRef<'_>) -> String {
    collapse_whitespace(&el.text().collect::<String>())
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| ScreenError::Extraction(format!("bad selector {css}: {e}")))
}

/// Read up to [`MAX_ROWS`] trade rows from a rendered page.
pub fn read_rows(html: &str) -> Result<Vec<RawRow>> {
    if html.trim().is_empty() {
        return Err(ScreenError::Extraction("page is empty".into()));
    }

    let document = Html::parse_document(html);
    let row_sel = selector("tr")?;
    let header_sel = selector("th, td")?;
    let data_sel = selector("td")?;

    for css in TABLE_SELECTORS {
        let table_sel = selector(css)?;
        for table in document.select(&table_sel) {
            let mut rows = table.select(&row_sel);
            let Some(header_row) = rows.next() else {
                continue;
            };
            let headers: Vec<String> = header_row
                .select(&header_sel)
                .map(|c| header_key(&cell_text(c)))
                .collect();
            let Some(columns) = ColumnMap::from_headers(&headers) else {
                continue;
            };

            let parsed = rows
                .take(MAX_ROWS)
                .filter_map(|tr| {
                    let cells: Vec<String> = tr.select(&data_sel).map(cell_text).collect();
                    read_row(&cells, &columns)
                })
                .collect();
            return Ok(parsed);
        }
    }

    Err(ScreenError::Extraction(
        "no table with a trade-type column".into(),
    ))
}

fn read_row(cells: &[String], columns: &ColumnMap) -> Option<RawRow> {
    let get = |i: Option<usize>| i.and_then(|i| cells.get(i)).cloned().unwrap_or_default();
    let trade_type = cells.get(columns.trade_type)?.clone();
    Some(RawRow {
        insider_name: get(columns.insider_name),
        title: get(columns.title),
        trade_type,
        trade_date: get(columns.trade_date),
        value: get(columns.value),
    })
}

/// Read the table and aggregate it as of `today`.
pub fn extract_summary(html: &str, today: NaiveDate) -> Result<InsiderSummary> {
    let rows = read_rows(html)?;
    Ok(summarize(&rows, today))
}
