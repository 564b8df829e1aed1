//! Generic installation check.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::cancel::CancelSignal;
use crate::error::VerifyError;
use crate::notification::NotificationPoller;
use crate::outcome::OutcomeSink;
use crate::race::Verifier;
use crate::watcher::{watch, WatchSpec};

impl<P: NotificationPoller> Verifier<P> {
    /// Wait for `expected` to appear in a notification stamped at or after
    /// `since`.
    ///
    /// There is no failure notification to race against: the absence of the
    /// event within `timeout` is the negative signal. With `node` set, only
    /// notifications about that node count. `Ok(())` means the notification
    /// was found.
    pub async fn check_installed(
        &self,
        node: Option<u64>,
        timeout: Duration,
        expected: &str,
        since: DateTime<Utc>,
    ) -> Result<(), VerifyError> {
        let mut spec = WatchSpec::success(expected, since)
            .poll_interval(self.config.poll_interval)
            .timeout(timeout);
        if let Some(node_id) = node {
            spec = spec.target(node_id);
        }

        let (sink, mut rx) = OutcomeSink::channel();
        watch(Arc::clone(&self.poller), spec, sink, CancelSignal::new()).await;

        let action = match node {
            Some(node_id) => format!("{expected:?} on node {node_id}"),
            None => format!("{expected:?}"),
        };

        match rx.recv().await {
            Some(outcome) => {
                let message = outcome.into_result(&action, timeout)?;
                info!(node_id = ?node, message = %message, "Installation confirmed");
                Ok(())
            }
            None => Err(VerifyError::Timeout { action, timeout }),
        }
    }
}
