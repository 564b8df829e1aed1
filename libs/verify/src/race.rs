//! Race coordinator: first definitive outcome among several watchers wins.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::Instant;
use tracing::{debug, info};

use crate::cancel::CancelSignal;
use crate::clock::{Clock, SystemClock};
use crate::error::VerifyError;
use crate::notification::NotificationPoller;
use crate::outcome::{Outcome, OutcomeSink};
use crate::watcher::{watch, WatchSpec, DEFAULT_POLL_INTERVAL};

/// Verifier configuration.
#[derive(Debug, Clone)]
pub struct VerifierConfig {
    /// Poll interval applied to specs built by the verifier itself.
    pub poll_interval: Duration,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// Entry point for notification-driven verification.
pub struct Verifier<P> {
    pub(crate) poller: Arc<P>,
    clock: Arc<dyn Clock>,
    pub(crate) config: VerifierConfig,
}

impl<P> Clone for Verifier<P> {
    fn clone(&self) -> Self {
        Self {
            poller: Arc::clone(&self.poller),
            clock: Arc::clone(&self.clock),
            config: self.config.clone(),
        }
    }
}

impl<P: NotificationPoller> Verifier<P> {
    pub fn new(poller: Arc<P>) -> Self {
        Self::with_config(poller, VerifierConfig::default())
    }

    pub fn with_config(poller: Arc<P>, config: VerifierConfig) -> Self {
        Self {
            poller,
            clock: Arc::new(SystemClock),
            config,
        }
    }

    /// Replace the wall clock used by [`now`](Self::now).
    pub fn with_clock(mut self, clock: impl Clock) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    pub fn poller(&self) -> &Arc<P> {
        &self.poller
    }

    /// Reference timestamp to take before triggering an action.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Race one watcher per spec and return the first outcome delivered.
    ///
    /// Losing watchers are cancelled but not awaited; each exits at its next
    /// cancellation check. Dropping the returned future before it resolves
    /// cancels the watchers too. If no watcher reports within the longest spec
    /// timeout plus the longest poll interval, the coordinator resolves the
    /// race with a timeout itself.
    pub async fn race(&self, action: &str, specs: Vec<WatchSpec>) -> Outcome {
        let start = Instant::now();
        let (sink, mut rx) = OutcomeSink::channel();
        let cancel = CancelSignal::new();
        let _stop_watchers = cancel.drop_guard();

        let longest_timeout = specs.iter().map(|s| s.timeout).max().unwrap_or_default();
        let longest_interval = specs
            .iter()
            .map(|s| s.poll_interval)
            .max()
            .unwrap_or_default();
        let backstop = longest_timeout + longest_interval;

        info!(
            action,
            watchers = specs.len(),
            timeout_secs = longest_timeout.as_secs(),
            "Starting verification race"
        );

        for spec in specs {
            tokio::spawn(watch(
                Arc::clone(&self.poller),
                spec,
                sink.clone(),
                cancel.clone(),
            ));
        }

        let first = tokio::select! {
            delivered = rx.recv() => delivered,
            _ = tokio::time::sleep(backstop) => None,
        };

        let outcome = match first {
            Some(outcome) => outcome,
            None => {
                if sink.deliver(Outcome::timeout()) {
                    debug!(action, "Race deadline reached before any watcher reported");
                }
                rx.recv().await.unwrap_or_else(Outcome::timeout)
            }
        };

        cancel.cancel();

        info!(
            action,
            is_error = outcome.is_error,
            message = %outcome.message,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Verification race resolved"
        );

        outcome
    }

    /// Like [`race`](Self::race), converted into a `Result`.
    pub async fn verify(&self, action: &str, specs: Vec<WatchSpec>) -> Result<String, VerifyError> {
        let timeout = specs.iter().map(|s| s.timeout).max().unwrap_or_default();
        self.race(action, specs).await.into_result(action, timeout)
    }
}
