//! Error types for verification.

use std::time::Duration;

use thiserror::Error;

/// Terminal failures of a verification.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VerifyError {
    /// No expected notification appeared before the deadline.
    #[error("timeout after {timeout:?} waiting for {action}")]
    Timeout { action: String, timeout: Duration },

    /// The server reported that the action failed.
    #[error("{action} failed: {message}")]
    Failed { action: String, message: String },
}

impl VerifyError {
    /// Returns true if this error is a timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
