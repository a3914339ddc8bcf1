//! `screener classify <FILE>`: classify a saved page offline.
//!
//! Runs the same rules as a live scrape over the file's HTML, including the
//! UNKNOWN → DOUBTFUL resolution, without starting a browser.

use super::output;
use crate::classifier::{self, ClassificationResult, ClassifierInput, ComplianceStatus};
use anyhow::{Context, Result};
use std::path::Path;

/// Classify the HTML document stored at `path`.
pub fn classify_file(path: &Path) -> Result<ClassificationResult> {
    let html = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let result = classifier::classify(&ClassifierInput::from_document(&html));
    if result.status == ComplianceStatus::Unknown {
        return Ok(ClassificationResult {
            status: ComplianceStatus::Doubtful,
            reason: format!("{} (resolved to DOUBTFUL)", result.reason),
            debug_info: result.debug_info,
        });
    }
    Ok(result)
}

pub async fn run(path: &Path) -> Result<()> {
    let result = classify_file(path)?;
    if output::is_json() {
        output::print_json(&result);
    } else {
        println!("{} {}", output::badge(result.status), result.status);
        if !output::is_quiet() {
            println!("  Reason: {}", result.reason);
        }
    }
    Ok(())
}
