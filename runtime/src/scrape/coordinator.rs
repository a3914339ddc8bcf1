//! Retry state machine for scrape requests.
//!
//! ```text
//!                +-----------+   accept    +---------+
//!   start -----> | ATTEMPTING| ----------> | SUCCESS |
//!                +-----------+             +---------+
//!                  |  ^   |
//!          timeout |  |   | error / rejected snapshot
//!                  v  |   v
//!                +-----------+  budget spent  +-----------+
//!                | RETRY_WAIT| -------------> | EXHAUSTED |
//!                +-----------+                +-----------+
//! ```
//!
//! Each attempt owns one [`TabSurrogate`]. The attempt future (navigation
//! plus in-page polling) is raced against the per-attempt timeout; whichever
//! way the race ends, the tab is closed before the next state is entered, so
//! a late result from a timed-out attempt can never be observed.

use super::readiness::{self, PageSnapshot, ReadinessPolicy};
use super::surrogate::TabSurrogate;
use super::ScrapeRequest;
use crate::error::{Result, ScreenError};
use crate::renderer::Renderer;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Maximum retries per request.
pub const MAX_RETRIES: u32 = 3;

/// Timing and budget for one kind of scrape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub attempt_timeout: Duration,
    /// Backoff after a failed attempt is `retry_count * backoff_step`.
    pub backoff_step: Duration,
}

impl RetryPolicy {
    pub fn status() -> Self {
        Self {
            max_retries: MAX_RETRIES,
            attempt_timeout: Duration::from_millis(30_000),
            backoff_step: Duration::from_millis(2_000),
        }
    }

    pub fn insider() -> Self {
        Self {
            attempt_timeout: Duration::from_millis(20_000),
            ..Self::status()
        }
    }

    fn backoff(&self, retries: u32) -> Duration {
        self.backoff_step * retries
    }
}

/// How an interpreter judged one snapshot.
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptVerdict<T> {
    /// Terminal success.
    Accept(T),
    /// Page produced an error result; retry with backoff.
    Retry(String),
    /// Page not usable yet; retry once, immediately.
    RetryOnce(String),
}

/// Live state of one attempt. Dropped (and its tab closed) on every exit.
pub struct ScrapeAttempt {
    pub index: u32,
    pub started_at: Instant,
    surrogate: TabSurrogate,
}

impl ScrapeAttempt {
    async fn begin(index: u32, renderer: &dyn Renderer) -> anyhow::Result<Self> {
        let surrogate = TabSurrogate::open(renderer).await?;
        Ok(Self {
            index,
            started_at: Instant::now(),
            surrogate,
        })
    }

    async fn load(
        &mut self,
        url: &str,
        nav_timeout_ms: u64,
        policy: &ReadinessPolicy,
    ) -> anyhow::Result<PageSnapshot> {
        self.surrogate.navigate(url, nav_timeout_ms).await?;
        readiness::await_snapshot(&self.surrogate, policy).await
    }

    async fn finish(mut self) {
        self.surrogate.close().await;
        debug!(
            attempt = self.index,
            elapsed_ms = self.started_at.elapsed().as_millis() as u64,
            "attempt finished"
        );
    }
}

/// Successful terminal state of a scrape.
#[derive(Debug, Clone)]
pub struct ScrapeOutcome<T> {
    pub value: T,
    pub snapshot: PageSnapshot,
    /// Attempts made, including the accepted one.
    pub attempts: u32,
    pub retries: u32,
}

/// Drives attempts for one request kind.
#[derive(Clone)]
pub struct RetryCoordinator {
    renderer: Arc<dyn Renderer>,
    policy: RetryPolicy,
    readiness: ReadinessPolicy,
}

impl RetryCoordinator {
    pub fn new(renderer: Arc<dyn Renderer>, policy: RetryPolicy, readiness: ReadinessPolicy) -> Self {
        Self {
            renderer,
            policy,
            readiness,
        }
    }

    /// Run attempts until `interpret` accepts a snapshot or the budget runs out.
    pub async fn run<T, F>(&self, request: &ScrapeRequest, mut interpret: F) -> Result<ScrapeOutcome<T>>
    where
        F: FnMut(&PageSnapshot) -> AttemptVerdict<T> + Send,
        T: Send,
    {
        let timeout_ms = self.policy.attempt_timeout.as_millis() as u64;
        let mut retries = 0u32;
        let mut attempts = 0u32;
        let mut single_retry_used = false;

        loop {
            attempts += 1;
            info!(ticker = %request.ticker, attempt = attempts, retries, "scrape attempt starting");

            let failure = match ScrapeAttempt::begin(attempts, self.renderer.as_ref()).await {
                Err(e) => AttemptFailure::Script(format!("failed to open tab: {e:#}")),
                Ok(mut attempt) => {
                    let raced = tokio::time::timeout(
                        self.policy.attempt_timeout,
                        attempt.load(&request.target_url, timeout_ms, &self.readiness),
                    )
                    .await;
                    attempt.finish().await;

                    match raced {
                        Err(_) => AttemptFailure::Timeout,
                        Ok(Err(e)) => AttemptFailure::Script(format!("{e:#}")),
                        Ok(Ok(snapshot)) => match interpret(&snapshot) {
                            AttemptVerdict::Accept(value) => {
                                info!(ticker = %request.ticker, attempts, retries, "scrape succeeded");
                                return Ok(ScrapeOutcome {
                                    value,
                                    snapshot,
                                    attempts,
                                    retries,
                                });
                            }
                            AttemptVerdict::Retry(reason) => AttemptFailure::Script(reason),
                            AttemptVerdict::RetryOnce(reason) => AttemptFailure::NotReady(reason),
                        },
                    }
                }
            };

            retries += 1;
            let under_budget = retries < self.policy.max_retries;

            match failure {
                AttemptFailure::Timeout => {
                    if !under_budget {
                        warn!(ticker = %request.ticker, retries, "scrape timed out; budget exhausted");
                        return Err(ScreenError::Timeout {
                            ms: timeout_ms,
                            context: format!(
                                "{} after {attempts} attempt(s)",
                                request.target_url
                            ),
                        });
                    }
                    warn!(ticker = %request.ticker, retries, "attempt timed out after {timeout_ms}ms; retrying");
                }
                AttemptFailure::Script(reason) => {
                    if !under_budget {
                        warn!(ticker = %request.ticker, retries, "scrape failed; budget exhausted: {reason}");
                        return Err(ScreenError::TransientScript(reason));
                    }
                    let delay = self.policy.backoff(retries);
                    warn!(
                        ticker = %request.ticker,
                        retries,
                        backoff_ms = delay.as_millis() as u64,
                        "attempt failed: {reason}"
                    );
                    tokio::time::sleep(delay).await;
                }
                AttemptFailure::NotReady(reason) => {
                    if single_retry_used || !under_budget {
                        return Err(ScreenError::Extraction(reason));
                    }
                    single_retry_used = true;
                    warn!(ticker = %request.ticker, "page not usable, retrying once: {reason}");
                }
            }
        }
    }
}

enum AttemptFailure {
    Timeout,
    Script(String),
    NotReady(String),
}
