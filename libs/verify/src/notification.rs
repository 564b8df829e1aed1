//! Notifications and the poller capability.

use std::fmt::Display;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// A timestamped text event emitted by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Human readable message; patterns are matched against it.
    pub text: String,

    /// When the server recorded the event.
    pub timestamp: DateTime<Utc>,

    /// Node the event refers to, if the server says.
    pub target_id: Option<u64>,
}

impl Notification {
    pub fn new(text: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            text: text.into(),
            timestamp,
            target_id: None,
        }
    }

    pub fn with_target(mut self, target_id: u64) -> Self {
        self.target_id = Some(target_id);
        self
    }
}

/// Fetches notifications newer than a reference timestamp.
///
/// Implementations should be idempotent; they may be slow or fail
/// transiently. Watchers log failures and keep polling.
#[async_trait]
pub trait NotificationPoller: Send + Sync + 'static {
    type Error: Display + Send + Sync + 'static;

    async fn poll_notifications(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<Notification>, Self::Error>;
}

#[async_trait]
impl<P: NotificationPoller> NotificationPoller for Arc<P> {
    type Error = P::Error;

    async fn poll_notifications(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<Notification>, Self::Error> {
        (**self).poll_notifications(since).await
    }
}
