//! In-page readiness polling.
//!
//! The target pages render client-side, so waiting has to happen inside the
//! tab. [`ReadinessPolicy::script`] produces a self-contained promise that
//! polls every `interval` for `document.readyState === "complete"` followed
//! by a content signal (a marker selector or keyword), and resolves with a
//! snapshot. When `max_wait` elapses first it resolves anyway with
//! `contentFound: false`, so the script never blocks forever.

use super::surrogate::TabSurrogate;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const SCRIPT_TEMPLATE: &str = r#"new Promise((resolve) => {
  const cfg = __CONFIG__;
  const started = Date.now();
  const hasContent = () => {
    if (document.readyState !== 'complete' || !document.body) return false;
    for (const sel of cfg.selectors) {
      try { if (document.querySelector(sel)) return true; } catch (_) {}
    }
    const text = (document.body.innerText || '').toUpperCase();
    return cfg.keywords.some((k) => text.includes(k));
  };
  const snapshot = (found) => ({
    ready: document.readyState === 'complete',
    contentFound: found,
    waitedMs: Date.now() - started,
    bodyText: document.body ? (document.body.innerText || '') : '',
    bodyHtml: document.body ? (document.body.innerHTML || '') : '',
    documentHtml: document.documentElement ? document.documentElement.outerHTML : ''
  });
  const tick = () => {
    let found = false;
    try { found = hasContent(); } catch (_) {}
    if (found) { resolve(snapshot(true)); return; }
    if (Date.now() - started >= cfg.maxWaitMs) { resolve(snapshot(false)); return; }
    setTimeout(tick, cfg.intervalMs);
  };
  tick();
})"#;

/// How long and for what the in-page poller waits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadinessPolicy {
    pub interval: Duration,
    pub max_wait: Duration,
    /// CSS selectors whose presence means the content rendered.
    pub selectors: Vec<String>,
    /// Upper-case substrings of `innerText` that mean the same.
    pub keywords: Vec<String>,
}

impl ReadinessPolicy {
    /// Compliance-status pages: chips or a verdict word, up to 10 s.
    pub fn status_page() -> Self {
        Self {
            interval: Duration::from_millis(500),
            max_wait: Duration::from_millis(10_000),
            selectors: [
                ".halal-chip",
                ".not-halal-chip",
                ".doubtful-chip",
                "[class*='compliance']",
                "[class*='shariah']",
            ]
            .map(String::from)
            .to_vec(),
            keywords: ["NOT HALAL", "HALAL", "DOUBTFUL", "COMPLIANT"]
                .map(String::from)
                .to_vec(),
        }
    }

    /// Insider tables: a populated table body, up to 5 s.
    pub fn table_page() -> Self {
        Self {
            interval: Duration::from_millis(500),
            max_wait: Duration::from_millis(5_000),
            selectors: ["table.tinytable tbody tr", "table tbody tr td"]
                .map(String::from)
                .to_vec(),
            keywords: ["TRADE TYPE", "INSIDER NAME"].map(String::from).to_vec(),
        }
    }

    /// The injected polling script for this policy.
    pub fn script(&self) -> String {
        let cfg = serde_json::json!({
            "intervalMs": self.interval.as_millis() as u64,
            "maxWaitMs": self.max_wait.as_millis() as u64,
            "selectors": self.selectors,
            "keywords": self.keywords.iter().map(|k| k.to_uppercase()).collect::<Vec<_>>(),
        });
        SCRIPT_TEMPLATE.replace("__CONFIG__", &cfg.to_string())
    }
}

/// What the poller saw when it stopped waiting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageSnapshot {
    /// `document.readyState` was `complete`.
    pub ready: bool,
    /// A content signal fired before the bound.
    pub content_found: bool,
    pub waited_ms: u64,
    pub body_text: String,
    pub body_html: String,
    pub document_html: String,
}

impl PageSnapshot {
    /// Full document HTML, or the body when the document was not captured.
    pub fn full_html(&self) -> &str {
        if self.document_html.trim().is_empty() {
            &self.body_html
        } else {
            &self.document_html
        }
    }
}

/// Run the poller in `tab` and decode its snapshot.
pub async fn await_snapshot(tab: &TabSurrogate, policy: &ReadinessPolicy) -> Result<PageSnapshot> {
    let raw = tab.evaluate(&policy.script()).await?;
    if raw.is_null() {
        anyhow::bail!("readiness script returned nothing");
    }
    serde_json::from_value(raw).context("malformed readiness snapshot")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::scripted::{ScriptStep, ScriptedRenderer};

    #[test]
    fn test_script_embeds_policy_bounds() {
        let script = ReadinessPolicy::status_page().script();
        assert!(script.contains(r#""intervalMs":500"#));
        assert!(script.contains(r#""maxWaitMs":10000"#));
        assert!(script.contains(".not-halal-chip"));
        assert!(!script.contains("__CONFIG__"));

        let table = ReadinessPolicy::table_page().script();
        assert!(table.contains(r#""maxWaitMs":5000"#));
    }

    #[test]
    fn test_script_escapes_selector_quotes() {
        let policy = ReadinessPolicy {
            selectors: vec![r#"[data-x="a'b"]"#.to_string()],
            ..ReadinessPolicy::status_page()
        };
        let script = policy.script();
        assert!(script.contains(r#"[data-x=\"a'b\"]"#));
    }

    #[test]
    fn test_keywords_are_uppercased() {
        let policy = ReadinessPolicy {
            keywords: vec!["halal".to_string()],
            ..ReadinessPolicy::status_page()
        };
        assert!(policy.script().contains(r#""keywords":["HALAL"]"#));
    }

    #[tokio::test]
    async fn test_await_snapshot_decodes_best_effort_result() {
        let renderer = ScriptedRenderer::new([ScriptStep::Respond(serde_json::json!({
            "ready": true,
            "contentFound": false,
            "waitedMs": 10_012,
            "bodyText": "Loading...",
            "bodyHtml": "<div>Loading...</div>",
        }))]);
        let mut tab = TabSurrogate::open(&renderer).await.unwrap();
        let snap = await_snapshot(&tab, &ReadinessPolicy::status_page())
            .await
            .unwrap();
        tab.close().await;

        assert!(!snap.content_found);
        assert_eq!(snap.waited_ms, 10_012);
        assert_eq!(snap.full_html(), "<div>Loading...</div>");
        assert!(renderer.scripts()[0].starts_with("new Promise"));
    }

    #[tokio::test]
    async fn test_await_snapshot_rejects_null() {
        let renderer = ScriptedRenderer::new([ScriptStep::Respond(serde_json::Value::Null)]);
        let mut tab = TabSurrogate::open(&renderer).await.unwrap();
        assert!(await_snapshot(&tab, &ReadinessPolicy::table_page())
            .await
            .is_err());
        tab.close().await;
    }
}
