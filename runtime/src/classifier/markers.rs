//! Structural markers derived from rendered HTML.
//!
//! The status page exposes its verdict as styled "chips" whose class names
//! carry the verdict (`halal-chip`, `not-halal-chip`, `doubtful-chip`) plus a
//! short status label. This module walks the DOM once and collects both.
//!
//! All functions are synchronous: `scraper::Html` is `!Send` and must not be
//! held across an `.await`.

use scraper::{ElementRef, Html, Selector};

/// Longest label text still treated as a status element.
const MAX_STATUS_TEXT_LEN: usize = 60;

/// Class fragments that mark an element as carrying a status label.
const STATUS_CLASS_HINTS: &[&str] = &["status", "compliance", "chip", "badge", "verdict"];

/// Class fragments on an ancestor that negate a nested halal marker.
const NEGATION_CLASS_HINTS: &[&str] = &["not-", "not_", "non-", "non_", "negative", "fail"];

/// A class token that mentions "halal" without negation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HalalMarker {
    pub class: String,
    /// Some ancestor's class indicates negation.
    pub negated: bool,
}

/// Everything the classifier needs from the DOM.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructuralMarkers {
    /// Class tokens such as `not-halal-chip`.
    pub not_halal: Vec<String>,
    /// Class tokens such as `doubtful-chip`.
    pub doubtful: Vec<String>,
    pub halal: Vec<HalalMarker>,
    /// Upper-cased, whitespace-collapsed labels of status-like elements.
    pub status_texts: Vec<String>,
}

impl StructuralMarkers {
    pub fn is_empty(&self) -> bool {
        self.not_halal.is_empty()
            && self.doubtful.is_empty()
            && self.halal.is_empty()
            && self.status_texts.is_empty()
    }
}

/// Scan HTML (fragment or full document) for verdict markers.
pub fn scan(html: &str) -> StructuralMarkers {
    let mut markers = StructuralMarkers::default();
    if html.trim().is_empty() {
        return markers;
    }

    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse("[class]") else {
        return markers;
    };

    for el in document.select(&selector) {
        let tokens = class_tokens(&el);
        let mut is_status = false;

        for token in &tokens {
            if is_not_halal_token(token) {
                push_unique(&mut markers.not_halal, token);
            } else if token.contains("doubtful") {
                push_unique(&mut markers.doubtful, token);
            } else if token.contains("halal") {
                let marker = HalalMarker {
                    class: token.clone(),
                    negated: has_negating_ancestor(&el),
                };
                if !markers.halal.contains(&marker) {
                    markers.halal.push(marker);
                }
            }
            if STATUS_CLASS_HINTS.iter().any(|h| token.contains(h)) {
                is_status = true;
            }
        }

        if is_status {
            let text = collapse_whitespace(&el.text().collect::<String>());
            if !text.is_empty() && text.chars().count() <= MAX_STATUS_TEXT_LEN {
                let upper = text.to_uppercase();
                if !markers.status_texts.contains(&upper) {
                    markers.status_texts.push(upper);
                }
            }
        }
    }

    markers
}

/// Visible text of a document, whitespace-collapsed. Script and style
/// contents are skipped.
pub fn visible_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let root = document.root_element();
    let mut out = String::new();
    collect_text(root, &mut out);
    collapse_whitespace(&out)
}

fn collect_text(el: ElementRef<'_>, out: &mut String) {
    let name = el.value().name();
    if matches!(name, "script" | "style" | "noscript" | "template") {
        return;
    }
    for child in el.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
            out.push(' ');
        } else if let Some(child_el) = ElementRef::wrap(child) {
            collect_text(child_el, out);
        }
    }
}

fn class_tokens(el: &ElementRef<'_>) -> Vec<String> {
    el.value()
        .attr("class")
        .unwrap_or_default()
        .split_whitespace()
        .map(|t| t.to_ascii_lowercase())
        .collect()
}

fn is_not_halal_token(token: &str) -> bool {
    ["not-halal", "not_halal", "nothalal", "non-halal", "non_halal"]
        .iter()
        .any(|n| token.contains(n))
}

fn has_negating_ancestor(el: &ElementRef<'_>) -> bool {
    el.ancestors().filter_map(ElementRef::wrap).any(|ancestor| {
        class_tokens(&ancestor)
            .iter()
            .any(|t| NEGATION_CLASS_HINTS.iter().any(|h| t.contains(h)))
    })
}

fn push_unique(list: &mut Vec<String>, token: &str) {
    if !list.iter().any(|t| t == token) {
        list.push(token.to_string());
    }
}

pub(crate) fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_chip_classes() {
        let html = r#"<div class="card">
            <span class="chip not-halal-chip">NOT HALAL</span>
            <span class="doubtful-chip hidden">DOUBTFUL</span>
        </div>"#;
        let m = scan(html);
        assert_eq!(m.not_halal, vec!["not-halal-chip".to_string()]);
        assert_eq!(m.doubtful, vec!["doubtful-chip".to_string()]);
        assert!(m.halal.is_empty());
        assert!(m.status_texts.contains(&"NOT HALAL".to_string()));
    }

    #[test]
    fn test_halal_marker_negated_by_ancestor() {
        let html = r#"<div class="result not-compliant"><i class="halal-icon"></i></div>"#;
        let m = scan(html);
        assert_eq!(m.halal.len(), 1);
        assert!(m.halal[0].negated);

        let clean = scan(r#"<div class="result"><i class="halal-icon"></i></div>"#);
        assert!(!clean.halal[0].negated);
    }

    #[test]
    fn test_long_status_containers_are_ignored() {
        let long = "word ".repeat(40);
        let html = format!(r#"<section class="status-panel">{long}</section>"#);
        assert!(scan(&html).status_texts.is_empty());
    }

    #[test]
    fn test_status_text_is_collapsed_and_uppercased() {
        let html = r#"<p class="compliance-status">  Halal
              </p>"#;
        assert_eq!(scan(html).status_texts, vec!["HALAL".to_string()]);
    }

    #[test]
    fn test_visible_text_skips_scripts() {
        let html = r#"<html><head><script>var s = "NOT HALAL";</script></head>
            <body><h1>Apple Inc</h1><p>Compliant</p></body></html>"#;
        let text = visible_text(html);
        assert!(text.contains("Apple Inc"));
        assert!(!text.contains("NOT HALAL"));
    }

    #[test]
    fn test_empty_html() {
        assert!(scan("").is_empty());
        assert!(scan("   ").is_empty());
    }
}
