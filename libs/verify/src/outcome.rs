//! Race outcomes and the single-delivery sink.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::error::VerifyError;
use crate::watcher::{Expectation, WatchSpec};

/// Message carried by an outcome produced by a deadline.
pub const TIMEOUT_MESSAGE: &str = "timeout";

/// Terminal result of a verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub is_error: bool,

    /// Matched notification text verbatim, or [`TIMEOUT_MESSAGE`].
    pub message: String,

    /// Pattern that matched; `None` for timeouts.
    pub pattern: Option<String>,
}

impl Outcome {
    /// Outcome for a notification matching `spec`.
    pub fn matched(spec: &WatchSpec, text: impl Into<String>) -> Self {
        Self {
            is_error: spec.expectation == Expectation::Failure,
            message: text.into(),
            pattern: Some(spec.pattern.clone()),
        }
    }

    pub fn timeout() -> Self {
        Self {
            is_error: true,
            message: TIMEOUT_MESSAGE.to_string(),
            pattern: None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        self.pattern.is_none() && self.message == TIMEOUT_MESSAGE
    }

    /// Convert into a `Result`, yielding the notification text on success.
    pub fn into_result(self, action: &str, timeout: Duration) -> Result<String, VerifyError> {
        if !self.is_error {
            return Ok(self.message);
        }
        if self.is_timeout() {
            return Err(VerifyError::Timeout {
                action: action.to_string(),
                timeout,
            });
        }
        Err(VerifyError::Failed {
            action: action.to_string(),
            message: self.message,
        })
    }
}

/// Single-delivery slot shared by the participants of one race.
///
/// The first [`deliver`](Self::deliver) wins; every later call is dropped
/// without error.
#[derive(Debug, Clone)]
pub struct OutcomeSink {
    claimed: Arc<AtomicBool>,
    tx: mpsc::UnboundedSender<Outcome>,
}

/// Receiving half of an [`OutcomeSink`].
#[derive(Debug)]
pub struct OutcomeReceiver {
    rx: mpsc::UnboundedReceiver<Outcome>,
}

impl OutcomeSink {
    pub fn channel() -> (Self, OutcomeReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        let sink = Self {
            claimed: Arc::new(AtomicBool::new(false)),
            tx,
        };
        (sink, OutcomeReceiver { rx })
    }

    /// Attempt delivery. Returns true only for the winning writer.
    pub fn deliver(&self, outcome: Outcome) -> bool {
        if self
            .claimed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }
        self.tx.send(outcome).is_ok()
    }

    pub fn is_resolved(&self) -> bool {
        self.claimed.load(Ordering::Acquire)
    }
}

impl OutcomeReceiver {
    /// Wait for the delivered outcome.
    ///
    /// Returns `None` only if every sink was dropped without delivering.
    pub async fn recv(&mut self) -> Option<Outcome> {
        self.rx.recv().await
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    #[test]
    fn test_matched_outcome_follows_expectation() {
        let now = Utc::now();
        let ok = WatchSpec::success("added", now);
        let failed = WatchSpec::failure("add failed", now);

        let outcome = Outcome::matched(&ok, "node 12 added");
        assert!(!outcome.is_error);
        assert_eq!(outcome.pattern.as_deref(), Some("added"));

        let outcome = Outcome::matched(&failed, "node 12 add failed");
        assert!(outcome.is_error);
        assert!(!outcome.is_timeout());
    }

    #[test]
    fn test_into_result() {
        let timeout = Duration::from_secs(5);
        let now = Utc::now();

        let ok = Outcome::matched(&WatchSpec::success("OK", now), "OK-node-12");
        assert_eq!(ok.into_result("nodeAdd", timeout).unwrap(), "OK-node-12");

        let err = Outcome::timeout().into_result("nodeAdd", timeout).unwrap_err();
        assert_eq!(
            err,
            VerifyError::Timeout {
                action: "nodeAdd".to_string(),
                timeout
            }
        );

        let failed = Outcome::matched(&WatchSpec::failure("FAIL", now), "FAIL-node-12");
        let err = failed.into_result("nodeAdd", timeout).unwrap_err();
        assert!(matches!(err, VerifyError::Failed { message, .. } if message == "FAIL-node-12"));
    }

    #[tokio::test]
    async fn test_first_delivery_wins() {
        let (sink, mut rx) = OutcomeSink::channel();
        let now = Utc::now();

        assert!(!sink.is_resolved());
        assert!(sink.deliver(Outcome::matched(&WatchSpec::success("OK", now), "OK")));
        assert!(!sink.clone().deliver(Outcome::timeout()));
        assert!(sink.is_resolved());

        let outcome = rx.recv().await.unwrap();
        assert_eq!(outcome.message, "OK");

        drop(sink);
        assert!(rx.recv().await.is_none(), "no second outcome may be observed");
    }

    #[tokio::test]
    async fn test_concurrent_writers_deliver_once() {
        let (sink, mut rx) = OutcomeSink::channel();

        let handles: Vec<_> = (0..32)
            .map(|_| {
                let sink = sink.clone();
                tokio::spawn(async move { sink.deliver(Outcome::timeout()) })
            })
            .collect();
        drop(sink);

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
        assert!(rx.recv().await.is_some());
        assert!(rx.recv().await.is_none());
    }
}
