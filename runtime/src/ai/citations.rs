//! Citation extraction and merging.
//!
//! Structured metadata wins over links written inline in the answer. Within
//! grounding metadata, direct publisher URLs are preferred; opaque
//! `grounding-api-redirect` URLs are used only when no direct URL exists.
//! Every list is deduplicated in order and capped.

use super::Source;
use regex::Regex;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::OnceLock;

const REDIRECT_HOST: &str = "vertexaisearch.cloud.google.com";
const REDIRECT_MARKER: &str = "grounding-api-redirect";

/// Opaque redirect URL issued by grounding search.
pub fn is_redirect(url: &str) -> bool {
    if url.contains(REDIRECT_MARKER) {
        return true;
    }
    url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.eq_ignore_ascii_case(REDIRECT_HOST)))
        .unwrap_or(false)
}

/// Sources from `candidates[0].groundingMetadata.groundingChunks[].web`.
pub fn from_grounding(body: &Value) -> Vec<Source> {
    let chunks = body
        .pointer("/candidates/0/groundingMetadata/groundingChunks")
        .and_then(Value::as_array);
    let Some(chunks) = chunks else {
        return Vec::new();
    };

    let (redirects, direct): (Vec<Source>, Vec<Source>) = chunks
        .iter()
        .filter_map(|c| c.get("web"))
        .filter_map(|web| {
            let url = web.get("uri").and_then(Value::as_str)?;
            source(web.get("title").and_then(Value::as_str), url)
        })
        .partition(|s| is_redirect(&s.url));

    if direct.is_empty() {
        redirects
    } else {
        direct
    }
}

/// Sources from `output[].content[].annotations[]` of type `url_citation`,
/// then from a top-level `citations` list.
pub fn from_output_items(body: &Value) -> Vec<Source> {
    let mut out = Vec::new();

    let annotations = body
        .get("output")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|item| item.get("content").and_then(Value::as_array))
        .flatten()
        .filter_map(|c| c.get("annotations").and_then(Value::as_array))
        .flatten();
    for a in annotations {
        if a.get("type").and_then(Value::as_str) != Some("url_citation") {
            continue;
        }
        if let Some(s) = a
            .get("url")
            .and_then(Value::as_str)
            .and_then(|url| source(a.get("title").and_then(Value::as_str), url))
        {
            out.push(s);
        }
    }

    for c in body
        .get("citations")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
    {
        let parsed = match c {
            Value::String(url) => source(None, url),
            Value::Object(_) => c
                .get("url")
                .and_then(Value::as_str)
                .and_then(|url| source(c.get("title").and_then(Value::as_str), url)),
            _ => None,
        };
        out.extend(parsed);
    }

    out
}

/// Markdown links `[title](https://...)` in the answer text.
pub fn inline_links(text: &str) -> Vec<Source> {
    static LINK: OnceLock<Option<Regex>> = OnceLock::new();
    let Some(re) = LINK
        .get_or_init(|| Regex::new(r"\[([^\]\n]+)\]\((https?://[^\s)]+)\)").ok())
        .as_ref()
    else {
        return Vec::new();
    };
    re.captures_iter(text)
        .filter_map(|caps| source(caps.get(1).map(|m| m.as_str()), caps.get(2)?.as_str()))
        .collect()
}

/// Order-preserving dedupe of `primary`, then `inline`, up to `cap` entries.
pub fn merge(primary: Vec<Source>, inline: Vec<Source>, cap: usize) -> Vec<Source> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for s in primary.into_iter().chain(inline) {
        if out.len() >= cap {
            break;
        }
        if seen.insert(dedupe_key(&s.url)) {
            out.push(s);
        }
    }
    out
}

fn dedupe_key(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

fn source(title: Option<&str>, url: &str) -> Option<Source> {
    let url = url.trim();
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return None;
    }
    let title = title
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .or_else(|| url::Url::parse(url).ok()?.host_str().map(str::to_string))
        .unwrap_or_else(|| url.to_string());
    Some(Source {
        title,
        url: url.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn s(url: &str) -> Source {
        Source {
            title: "t".into(),
            url: url.into(),
        }
    }

    #[test]
    fn test_redirect_detection() {
        assert!(is_redirect(
            "https://vertexaisearch.cloud.google.com/grounding-api-redirect/AbC"
        ));
        assert!(is_redirect("https://example.com/grounding-api-redirect/x"));
        assert!(!is_redirect("https://www.reuters.com/markets/"));
        assert!(!is_redirect("not a url"));
    }

    #[test]
    fn test_direct_urls_preferred_over_redirects() {
        let body = json!({"candidates": [{"groundingMetadata": {"groundingChunks": [
            {"web": {"uri": "https://vertexaisearch.cloud.google.com/grounding-api-redirect/1", "title": "reuters.com"}},
            {"web": {"uri": "https://www.sec.gov/filing", "title": "SEC"}},
            {"retrievedContext": {"uri": "gs://bucket"}}
        ]}}]});
        let sources = from_grounding(&body);
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].url, "https://www.sec.gov/filing");
        assert_eq!(sources[0].title, "SEC");
    }

    #[test]
    fn test_redirects_used_when_nothing_else() {
        let body = json!({"candidates": [{"groundingMetadata": {"groundingChunks": [
            {"web": {"uri": "https://vertexaisearch.cloud.google.com/grounding-api-redirect/1", "title": "reuters.com"}}
        ]}}]});
        assert_eq!(from_grounding(&body).len(), 1);
        assert!(from_grounding(&json!({"candidates": [{}]})).is_empty());
    }

    #[test]
    fn test_output_annotations_and_citations() {
        let body = json!({
            "output": [{"type": "message", "content": [{
                "type": "output_text",
                "text": "x",
                "annotations": [
                    {"type": "url_citation", "url": "https://a.com/1", "title": "A"},
                    {"type": "file_citation", "file_id": "f"}
                ]
            }]}],
            "citations": ["https://b.com/2", {"url": "https://c.com/3", "title": "C"}, 7]
        });
        let urls: Vec<String> = from_output_items(&body).into_iter().map(|s| s.url).collect();
        assert_eq!(urls, ["https://a.com/1", "https://b.com/2", "https://c.com/3"]);
    }

    #[test]
    fn test_inline_links() {
        let links = inline_links(
            "See [Reuters](https://reuters.com/a) and [bad](ftp://x) and [SEC](https://sec.gov/b).",
        );
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].title, "Reuters");
        assert_eq!(links[1].url, "https://sec.gov/b");
    }

    #[test]
    fn test_merge_dedupes_in_order_and_caps() {
        let merged = merge(
            vec![s("https://a.com/"), s("https://b.com"), s("https://a.com")],
            vec![s("https://b.com/"), s("https://c.com"), s("https://d.com")],
            3,
        );
        let urls: Vec<&str> = merged.iter().map(|s| s.url.as_str()).collect();
        assert_eq!(urls, ["https://a.com/", "https://b.com", "https://c.com"]);
    }

    #[test]
    fn test_title_falls_back_to_host() {
        let src = source(Some("  "), "https://www.sec.gov/x").unwrap();
        assert_eq!(src.title, "www.sec.gov");
    }
}
