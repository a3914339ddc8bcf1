//! Scripted renderer for tests.
//!
//! Every `execute_js` call pops the next [`ScriptStep`] from a queue shared by
//! all tabs, so a test can say "first attempt fails, second hangs, third
//! returns this page". Opens and closes are counted for leak assertions.

use super::{NavigationResult, RenderContext, Renderer};
use anyhow::{bail, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// What the next script evaluation does.
#[derive(Debug, Clone)]
pub enum ScriptStep {
    /// Resolve with this JSON value.
    Respond(Value),
    /// Reject with this message.
    Fail(String),
    /// Never resolve.
    Hang,
}

impl ScriptStep {
    /// A readiness snapshot of the given body HTML and text.
    pub fn page(body_html: &str, body_text: &str) -> Self {
        ScriptStep::Respond(serde_json::json!({
            "ready": true,
            "contentFound": true,
            "waitedMs": 500,
            "bodyText": body_text,
            "bodyHtml": body_html,
            "documentHtml": format!("<html><head></head><body>{body_html}</body></html>"),
        }))
    }

    /// A snapshot whose document HTML differs from the body (e.g. hydration data in `<head>`).
    pub fn page_with_document(body_html: &str, body_text: &str, document_html: &str) -> Self {
        ScriptStep::Respond(serde_json::json!({
            "ready": true,
            "contentFound": false,
            "waitedMs": 10_000,
            "bodyText": body_text,
            "bodyHtml": body_html,
            "documentHtml": document_html,
        }))
    }
}

#[derive(Default)]
struct Shared {
    steps: Mutex<VecDeque<ScriptStep>>,
    scripts: Mutex<Vec<String>>,
    visited: Mutex<Vec<String>>,
    opened: AtomicUsize,
    closed: AtomicUsize,
    close_fails: AtomicBool,
    shut_down: AtomicBool,
}

/// Renderer that replays a fixed sequence of script results.
#[derive(Clone, Default)]
pub struct ScriptedRenderer {
    shared: Arc<Shared>,
}

impl ScriptedRenderer {
    pub fn new(steps: impl IntoIterator<Item = ScriptStep>) -> Self {
        let renderer = Self::default();
        lock(&renderer.shared.steps).extend(steps);
        renderer
    }

    /// Make every tab close report an error. The tab still counts as closed.
    pub fn with_failing_close(self) -> Self {
        self.shared.close_fails.store(true, Ordering::SeqCst);
        self
    }

    /// Whether `shutdown` has been called.
    pub fn is_shut_down(&self) -> bool {
        self.shared.shut_down.load(Ordering::SeqCst)
    }

    /// Tabs opened so far.
    pub fn opened(&self) -> usize {
        self.shared.opened.load(Ordering::SeqCst)
    }

    /// Tabs closed so far.
    pub fn closed(&self) -> usize {
        self.shared.closed.load(Ordering::SeqCst)
    }

    /// URLs passed to `navigate`, in order.
    pub fn visited(&self) -> Vec<String> {
        lock(&self.shared.visited).clone()
    }

    /// Scripts passed to `execute_js`, in order.
    pub fn scripts(&self) -> Vec<String> {
        lock(&self.shared.scripts).clone()
    }

    /// Steps not consumed yet.
    pub fn remaining(&self) -> usize {
        lock(&self.shared.steps).len()
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

#[async_trait]
impl Renderer for ScriptedRenderer {
    async fn new_context(&self) -> Result<Box<dyn RenderContext>> {
        self.shared.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ScriptedContext {
            shared: Arc::clone(&self.shared),
        }))
    }

    async fn shutdown(&self) -> Result<()> {
        self.shared.shut_down.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn active_contexts(&self) -> usize {
        self.opened().saturating_sub(self.closed())
    }
}

struct ScriptedContext {
    shared: Arc<Shared>,
}

#[async_trait]
impl RenderContext for ScriptedContext {
    async fn navigate(&mut self, url: &str, _timeout_ms: u64) -> Result<NavigationResult> {
        lock(&self.shared.visited).push(url.to_string());
        Ok(NavigationResult {
            final_url: url.to_string(),
            load_time_ms: 0,
        })
    }

    async fn execute_js(&self, script: &str) -> Result<Value> {
        lock(&self.shared.scripts).push(script.to_string());
        let step = lock(&self.shared.steps).pop_front();
        match step {
            Some(ScriptStep::Respond(v)) => Ok(v),
            Some(ScriptStep::Fail(msg)) => bail!("{msg}"),
            Some(ScriptStep::Hang) => futures::future::pending().await,
            None => bail!("scripted renderer has no steps left"),
        }
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.shared.closed.fetch_add(1, Ordering::SeqCst);
        if self.shared.close_fails.load(Ordering::SeqCst) {
            bail!("target closed");
        }
        Ok(())
    }
}
