//! Compliance-status classifier.
//!
//! A pure function from a serialized page snapshot to a verdict. Rules are
//! evaluated in a fixed order and the first match wins; negative and
//! uncertain verdicts are checked before positive ones so that an ambiguous
//! page never reads as compliant.
//!
//! | # | Rule                                              | Verdict    |
//! |---|---------------------------------------------------|------------|
//! | 1 | `not-halal` class marker                          | NOT_HALAL  |
//! | 2 | `doubtful` class marker                           | DOUBTFUL   |
//! | 3 | status label with "NOT HALAL" / "NOT" + "HALAL"   | NOT_HALAL  |
//! | 4 | status label with "DOUBT"                         | DOUBTFUL   |
//! | 5 | status label with "HALAL"                         | HALAL      |
//! | 6 | guarded text scan for "NOT HALAL" / "NOT_HALAL"   | NOT_HALAL  |
//! | 7 | guarded text scan for "DOUBTFUL"                  | DOUBTFUL   |
//! | 8 | `halal` class marker without negating ancestor    | HALAL      |
//! | 9 | compliance phrasing regexes                       | either     |
//! |10 | nothing matched                                   | UNKNOWN    |
//!
//! An empty snapshot yields ERROR before the table runs. A bot-challenge
//! interstitial only turns rule 10 into ERROR, so a page that carries a
//! verdict is never discarded for mentioning "access denied".

pub mod markers;

use markers::StructuralMarkers;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Characters inspected before a guarded match.
const GUARD_BEFORE: usize = 50;
/// Characters inspected after a guarded match.
const GUARD_AFTER: usize = 100;
/// Words that mark a match as illustrative rather than a verdict.
const GUARD_WORDS: &[&str] = &["EXAMPLE", "TEMPLATE"];
/// Length of the HTML snippet carried by UNKNOWN results.
pub const DEBUG_SNIPPET_CHARS: usize = 500;

/// Phrases of common bot-challenge interstitials.
const CHALLENGE_PHRASES: &[&str] = &[
    "VERIFY YOU ARE HUMAN",
    "CHECKING YOUR BROWSER",
    "JUST A MOMENT...",
    "ACCESS DENIED",
];

/// Verdict of a classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComplianceStatus {
    Halal,
    NotHalal,
    Doubtful,
    Unknown,
    Error,
}

impl ComplianceStatus {
    /// UNKNOWN and ERROR call for further action by the coordinator.
    pub fn is_final(self) -> bool {
        matches!(self, Self::Halal | Self::NotHalal | Self::Doubtful)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Halal => "HALAL",
            Self::NotHalal => "NOT_HALAL",
            Self::Doubtful => "DOUBTFUL",
            Self::Unknown => "UNKNOWN",
            Self::Error => "ERROR",
        }
    }
}

impl std::fmt::Display for ComplianceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output of [`classify`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationResult {
    pub status: ComplianceStatus,
    pub reason: String,
    /// Truncated HTML for UNKNOWN results; `None` otherwise.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug_info: Option<String>,
}

impl ClassificationResult {
    fn new(status: ComplianceStatus, reason: impl Into<String>) -> Self {
        Self {
            status,
            reason: reason.into(),
            debug_info: None,
        }
    }
}

/// Serialized page content the classifier runs over.
#[derive(Debug, Clone, Default)]
pub struct ClassifierInput {
    pub body_text: String,
    pub body_html: String,
    pub markers: StructuralMarkers,
}

impl ClassifierInput {
    /// Build an input from a live snapshot's body text and body HTML.
    pub fn from_parts(body_text: &str, body_html: &str) -> Self {
        Self {
            body_text: body_text.to_string(),
            body_html: body_html.to_string(),
            markers: markers::scan(body_html),
        }
    }

    /// Build an input from a full serialized document alone.
    ///
    /// Used by the fallback reparse: text is recomputed from the parsed tree
    /// and the whole document (head included) is scanned.
    pub fn from_document(document_html: &str) -> Self {
        Self {
            body_text: markers::visible_text(document_html),
            body_html: document_html.to_string(),
            markers: markers::scan(document_html),
        }
    }
}

/// Classify a snapshot. Pure; never panics on arbitrary input.
pub fn classify(input: &ClassifierInput) -> ClassificationResult {
    use ComplianceStatus::*;

    let text = input.body_text.trim();
    let html = input.body_html.trim();
    if text.is_empty() && html.is_empty() {
        return ClassificationResult::new(Error, "Page snapshot is empty (not rendered)");
    }

    let upper_text = text.to_uppercase();
    let m = &input.markers;

    // 1-2: explicit class markers
    if let Some(class) = m.not_halal.first() {
        return ClassificationResult::new(
            NotHalal,
            format!("Found NOT HALAL marker element (class \"{class}\")"),
        );
    }
    if let Some(class) = m.doubtful.first() {
        return ClassificationResult::new(
            Doubtful,
            format!("Found DOUBTFUL marker element (class \"{class}\")"),
        );
    }

    // 3-5: status labels
    for label in &m.status_texts {
        let negated = has_word(label, "NOT") || label.contains("NON-HALAL");
        if label.contains("NOT HALAL") || (negated && label.contains("HALAL")) {
            return ClassificationResult::new(NotHalal, format!("Status label reads \"{label}\""));
        }
    }
    for label in &m.status_texts {
        if label.contains("DOUBT") {
            return ClassificationResult::new(Doubtful, format!("Status label reads \"{label}\""));
        }
    }
    for label in &m.status_texts {
        if label.contains("HALAL") && !has_word(label, "NOT") && !label.contains("NON-HALAL") {
            return ClassificationResult::new(Halal, format!("Status label reads \"{label}\""));
        }
    }

    // 6-7: guarded full-text scans
    let upper_html = html.to_uppercase();
    let sources = [upper_text.as_str(), upper_html.as_str()];
    for needle in ["NOT HALAL", "NOT_HALAL"] {
        if sources.iter().any(|s| guarded_find(s, needle).is_some()) {
            return ClassificationResult::new(NotHalal, format!("Page text contains \"{needle}\""));
        }
    }
    if sources.iter().any(|s| guarded_find(s, "DOUBTFUL").is_some()) {
        return ClassificationResult::new(Doubtful, "Page text contains \"DOUBTFUL\"");
    }

    // 8: positive class marker, unless nested in a negating container
    if let Some(marker) = m.halal.iter().find(|h| !h.negated) {
        return ClassificationResult::new(
            Halal,
            format!("Found HALAL marker element (class \"{}\")", marker.class),
        );
    }

    // 9: compliance phrasing
    for re in compliance_patterns() {
        if let Some(caps) = re.captures(text) {
            let phrase = caps.get(0).map(|c| c.as_str()).unwrap_or_default();
            let status = if caps.get(1).is_some() { NotHalal } else { Halal };
            return ClassificationResult::new(
                status,
                format!("Compliance phrase matched: \"{}\"", phrase.trim()),
            );
        }
    }

    if let Some(phrase) = CHALLENGE_PHRASES.iter().find(|p| upper_text.contains(*p)) {
        return ClassificationResult::new(
            Error,
            format!("Bot challenge page detected (\"{}\")", phrase.to_lowercase()),
        );
    }

    // 10
    ClassificationResult {
        status: Unknown,
        reason: "No compliance marker found on page".to_string(),
        debug_info: Some(truncate_chars(html, DEBUG_SNIPPET_CHARS)),
    }
}

/// Fallback pass over the full serialized document.
pub fn reparse_document(document_html: &str) -> ClassificationResult {
    classify(&ClassifierInput::from_document(document_html))
}

/// Find `needle` whose surrounding window holds no guard word.
///
/// Returns the byte offset of the first qualifying occurrence.
fn guarded_find(haystack: &str, needle: &str) -> Option<usize> {
    haystack.match_indices(needle).map(|(i, _)| i).find(|&i| {
        let start = floor_boundary(haystack, i.saturating_sub(GUARD_BEFORE));
        let end = ceil_boundary(haystack, (i + GUARD_AFTER).min(haystack.len()));
        let window = &haystack[start..end];
        !GUARD_WORDS.iter().any(|w| window.contains(w))
    })
}

fn floor_boundary(s: &str, mut i: usize) -> usize {
    while i > 0 && !s.is_char_boundary(i) {
        i -= 1;
    }
    i
}

fn ceil_boundary(s: &str, mut i: usize) -> usize {
    while i < s.len() && !s.is_char_boundary(i) {
        i += 1;
    }
    i
}

fn has_word(haystack: &str, word: &str) -> bool {
    haystack
        .split(|c: char| !c.is_ascii_alphanumeric())
        .any(|w| w == word)
}

pub(crate) fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

/// Capture group 1 is the optional negation.
fn compliance_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            r"(?i)\b(?:shariah|sharia|halal|compliance)\s+status\s*[:\-]?\s*(not\s+)?(?:halal|compliant)\b",
            r"(?i)\b(?:this\s+)?(?:stock|company|security|share)\s+is\s+(not\s+)?(?:halal|shariah[\s-]?compliant)\b",
            r"(?i)\b(not\s+)?shariah[\s-]?compliant\b",
        ]
        .iter()
        .filter_map(|p| Regex::new(p).ok())
        .collect()
    })
}
