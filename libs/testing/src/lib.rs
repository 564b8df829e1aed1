//! Test doubles for notification-driven verification.
//!
//! [`ScriptedPoller`] replays a fixed script of notifications against
//! tokio's clock, so tests run with `#[tokio::test(start_paused = true)]`
//! and finish instantly while still exercising real deadlines.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use pcc_verify::{Notification, NotificationPoller};
use tokio::time::Instant;

#[derive(Debug, Clone)]
struct Scripted {
    /// Offset from the poller's creation at which the event becomes visible.
    visible_at: Duration,
    notification: Notification,
}

/// Notification poller replaying a script on tokio time.
#[derive(Debug)]
pub struct ScriptedPoller {
    origin: Instant,
    base: DateTime<Utc>,
    script: Vec<Scripted>,
    fail_until: Duration,
    latency: Duration,
    calls: AtomicUsize,
}

impl ScriptedPoller {
    /// Create a poller whose simulated wall clock starts at `base`.
    pub fn new(base: DateTime<Utc>) -> Self {
        Self {
            origin: Instant::now(),
            base,
            script: Vec::new(),
            fail_until: Duration::ZERO,
            latency: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    /// Emit `text` at `base + at`.
    pub fn emit(self, at: Duration, text: impl Into<String>) -> Self {
        let timestamp = self.base + to_delta(at);
        self.push(at, Notification::new(text, timestamp))
    }

    /// Emit `text` about node `target` at `base + at`.
    pub fn emit_for(self, at: Duration, target: u64, text: impl Into<String>) -> Self {
        let timestamp = self.base + to_delta(at);
        self.push(at, Notification::new(text, timestamp).with_target(target))
    }

    /// A notification stamped `age` before `base`, visible from the start.
    pub fn preexisting(self, age: Duration, text: impl Into<String>) -> Self {
        let timestamp = self.base - to_delta(age);
        self.push(Duration::ZERO, Notification::new(text, timestamp))
    }

    /// Fail every poll issued before `until`.
    pub fn fail_until(mut self, until: Duration) -> Self {
        self.fail_until = until;
        self
    }

    /// Delay every poll by `latency`.
    pub fn latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn base(&self) -> DateTime<Utc> {
        self.base
    }

    /// Number of polls issued so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn push(mut self, visible_at: Duration, notification: Notification) -> Self {
        self.script.push(Scripted {
            visible_at,
            notification,
        });
        self
    }
}

fn to_delta(duration: Duration) -> TimeDelta {
    TimeDelta::from_std(duration).unwrap_or(TimeDelta::MAX)
}

#[async_trait]
impl NotificationPoller for ScriptedPoller {
    type Error = String;

    async fn poll_notifications(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<Notification>, Self::Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let elapsed = self.origin.elapsed();
        if elapsed < self.fail_until {
            return Err(format!("connection refused at {elapsed:?}"));
        }

        Ok(self
            .script
            .iter()
            .filter(|s| s.visible_at <= elapsed && s.notification.timestamp >= since)
            .map(|s| s.notification.clone())
            .collect())
    }
}
