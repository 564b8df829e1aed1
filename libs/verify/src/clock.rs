//! Wall clock used to stamp reference times.

use chrono::{DateTime, Utc};

/// Source of wall-clock timestamps.
///
/// Deadlines are measured with tokio's monotonic clock; this only produces
/// the `since` bound that is compared against server-side timestamps.
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> DateTime<Utc>;
}

/// The system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
