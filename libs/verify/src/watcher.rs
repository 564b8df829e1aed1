//! Watcher: polls for one notification pattern until match, cancel or deadline.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::cancel::CancelSignal;
use crate::notification::{Notification, NotificationPoller};
use crate::outcome::{Outcome, OutcomeSink};

/// Default delay between two polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Default watcher lifetime.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Floor for the poll interval so a zero value cannot spin.
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// What a matching notification means for the action being verified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expectation {
    Success,
    Failure,
}

/// Matching criterion and lifetime bounds of one watcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchSpec {
    /// Substring searched for in notification text.
    pub pattern: String,

    pub expectation: Expectation,

    /// Notifications stamped before this are never matched.
    pub since: DateTime<Utc>,

    pub poll_interval: Duration,

    pub timeout: Duration,

    /// Only match notifications about this node.
    pub target: Option<u64>,
}

impl WatchSpec {
    pub fn new(pattern: impl Into<String>, expectation: Expectation, since: DateTime<Utc>) -> Self {
        Self {
            pattern: pattern.into(),
            expectation,
            since,
            poll_interval: DEFAULT_POLL_INTERVAL,
            timeout: DEFAULT_TIMEOUT,
            target: None,
        }
    }

    pub fn success(pattern: impl Into<String>, since: DateTime<Utc>) -> Self {
        Self::new(pattern, Expectation::Success, since)
    }

    pub fn failure(pattern: impl Into<String>, since: DateTime<Utc>) -> Self {
        Self::new(pattern, Expectation::Failure, since)
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval.max(MIN_POLL_INTERVAL);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn target(mut self, node_id: u64) -> Self {
        self.target = Some(node_id);
        self
    }

    /// Whether `notification` satisfies this spec.
    pub fn matches(&self, notification: &Notification) -> bool {
        notification.timestamp >= self.since
            && notification.text.contains(&self.pattern)
            && self
                .target
                .is_none_or(|target| notification.target_id == Some(target))
    }
}

/// Run one watcher to completion.
///
/// Delivers at most one outcome into `sink`: the matching notification, or a
/// timeout once `spec.timeout` has elapsed. Returns without delivering when
/// `cancel` fires or another participant already resolved the sink.
pub async fn watch<P: NotificationPoller>(
    poller: P,
    spec: WatchSpec,
    sink: OutcomeSink,
    cancel: CancelSignal,
) {
    let start = Instant::now();
    let deadline = start + spec.timeout;
    let mut consecutive_failures = 0u32;

    debug!(
        pattern = %spec.pattern,
        since = %spec.since,
        poll_interval_ms = spec.poll_interval.as_millis() as u64,
        timeout_secs = spec.timeout.as_secs(),
        "Starting watcher"
    );

    let stopped = || cancel.is_cancelled() || sink.is_resolved();

    loop {
        if stopped() {
            debug!(pattern = %spec.pattern, "Watcher stopped");
            return;
        }

        let polled = tokio::select! {
            _ = cancel.cancelled() => {
                debug!(pattern = %spec.pattern, "Watcher cancelled during poll");
                return;
            }
            result = tokio::time::timeout_at(
                deadline + spec.poll_interval,
                poller.poll_notifications(spec.since),
            ) => result,
        };

        if stopped() {
            debug!(pattern = %spec.pattern, "Watcher stopped");
            return;
        }

        match polled {
            Ok(Ok(notifications)) => {
                consecutive_failures = 0;
                if let Some(notification) = notifications.iter().find(|n| spec.matches(n)) {
                    let delivered = sink.deliver(Outcome::matched(&spec, &notification.text));
                    info!(
                        pattern = %spec.pattern,
                        message = %notification.text,
                        delivered,
                        elapsed_ms = start.elapsed().as_millis() as u64,
                        "Watcher matched notification"
                    );
                    return;
                }
            }
            Ok(Err(e)) => {
                consecutive_failures += 1;
                if consecutive_failures <= 3 {
                    warn!(
                        pattern = %spec.pattern,
                        error = %e,
                        consecutive_failures,
                        "Notification poll failed"
                    );
                } else {
                    error!(
                        pattern = %spec.pattern,
                        error = %e,
                        consecutive_failures,
                        "Notification poll failed repeatedly"
                    );
                }
            }
            Err(_) => {
                consecutive_failures += 1;
                warn!(
                    pattern = %spec.pattern,
                    consecutive_failures,
                    "Notification poll did not complete before the deadline"
                );
            }
        }

        let now = Instant::now();
        if now >= deadline {
            let delivered = sink.deliver(Outcome::timeout());
            info!(
                pattern = %spec.pattern,
                delivered,
                timeout_secs = spec.timeout.as_secs(),
                "Watcher timed out"
            );
            return;
        }

        let next_poll = (now + spec.poll_interval).min(deadline);
        tokio::select! {
            _ = cancel.cancelled() => {
                debug!(pattern = %spec.pattern, "Watcher cancelled");
                return;
            }
            _ = tokio::time::sleep_until(next_poll) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;
    use chrono::TimeDelta;

    use super::*;

    /// Returns a fixed batch on every poll and counts calls.
    struct FixedPoller {
        batch: Vec<Notification>,
        calls: AtomicUsize,
    }

    impl FixedPoller {
        fn new(batch: Vec<Notification>) -> Arc<Self> {
            Arc::new(Self {
                batch,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl NotificationPoller for FixedPoller {
        type Error = String;

        async fn poll_notifications(
            &self,
            since: DateTime<Utc>,
        ) -> Result<Vec<Notification>, String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .batch
                .iter()
                .filter(|n| n.timestamp >= since)
                .cloned()
                .collect())
        }
    }

    #[test]
    fn test_matches_respects_since_bound() {
        let since = Utc::now();
        let spec = WatchSpec::success("added", since);

        let stale = Notification::new("node added", since - TimeDelta::seconds(1));
        let fresh = Notification::new("node added", since);
        let other = Notification::new("node removed", since);

        assert!(!spec.matches(&stale));
        assert!(spec.matches(&fresh));
        assert!(!spec.matches(&other));
    }

    #[test]
    fn test_matches_target_filter() {
        let since = Utc::now();
        let spec = WatchSpec::success("installed", since).target(7);

        assert!(spec.matches(&Notification::new("installed", since).with_target(7)));
        assert!(!spec.matches(&Notification::new("installed", since).with_target(8)));
        assert!(!spec.matches(&Notification::new("installed", since)));
    }

    #[test]
    fn test_poll_interval_floor() {
        let spec = WatchSpec::success("x", Utc::now()).poll_interval(Duration::ZERO);
        assert_eq!(spec.poll_interval, MIN_POLL_INTERVAL);
    }

    #[tokio::test(start_paused = true)]
    async fn test_watch_delivers_match() {
        let since = Utc::now();
        let poller = FixedPoller::new(vec![Notification::new("Node added: 12", since)]);
        let spec = WatchSpec::success("Node added", since).poll_interval(Duration::from_secs(1));
        let (sink, mut rx) = OutcomeSink::channel();

        watch(Arc::clone(&poller), spec, sink, CancelSignal::new()).await;

        let outcome = rx.recv().await.unwrap();
        assert!(!outcome.is_error);
        assert_eq!(outcome.message, "Node added: 12");
        assert_eq!(poller.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_watch_ignores_stale_notifications() {
        let since = Utc::now();
        let poller = FixedPoller::new(vec![Notification::new(
            "Node added: 12",
            since - TimeDelta::minutes(5),
        )]);
        let spec = WatchSpec::success("Node added", since)
            .poll_interval(Duration::from_secs(1))
            .timeout(Duration::from_secs(3));
        let (sink, mut rx) = OutcomeSink::channel();

        watch(poller, spec, sink, CancelSignal::new()).await;

        assert!(rx.recv().await.unwrap().is_timeout());
    }

    #[tokio::test(start_paused = true)]
    async fn test_watch_times_out() {
        let poller = FixedPoller::new(vec![]);
        let spec = WatchSpec::failure("failed", Utc::now())
            .poll_interval(Duration::from_secs(1))
            .timeout(Duration::from_secs(5));
        let (sink, mut rx) = OutcomeSink::channel();

        let start = Instant::now();
        watch(Arc::clone(&poller), spec, sink, CancelSignal::new()).await;

        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(5) && elapsed < Duration::from_secs(6));
        assert!(rx.recv().await.unwrap().is_timeout());
        // Polls at 0..=5s.
        assert_eq!(poller.calls.load(Ordering::SeqCst), 6);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_watcher_does_not_deliver() {
        let poller = FixedPoller::new(vec![]);
        let spec = WatchSpec::success("added", Utc::now())
            .poll_interval(Duration::from_secs(1))
            .timeout(Duration::from_secs(60));
        let (sink, mut rx) = OutcomeSink::channel();
        let cancel = CancelSignal::new();

        let handle = tokio::spawn(watch(poller, spec, sink.clone(), cancel.clone()));
        tokio::time::sleep(Duration::from_millis(2500)).await;
        cancel.cancel();
        handle.await.unwrap();

        assert!(!sink.is_resolved());
        drop(sink);
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_watcher_stops_when_sink_resolved_elsewhere() {
        let poller = FixedPoller::new(vec![]);
        let spec = WatchSpec::success("added", Utc::now())
            .poll_interval(Duration::from_secs(1))
            .timeout(Duration::from_secs(60));
        let (sink, _rx) = OutcomeSink::channel();

        let handle = tokio::spawn(watch(
            Arc::clone(&poller),
            spec,
            sink.clone(),
            CancelSignal::new(),
        ));
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(sink.deliver(Outcome::timeout()));

        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("watcher should exit within one poll interval")
            .unwrap();
        assert_eq!(poller.calls.load(Ordering::SeqCst), 1);
    }
}
