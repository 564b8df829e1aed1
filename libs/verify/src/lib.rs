//! # pcc-verify
//!
//! Verification of asynchronous PCC actions by watching the server's
//! notification stream.
//!
//! Enrolling a node, installing an application or power-cycling a server
//! returns long before the work is done. The server eventually emits a
//! notification describing the result; this crate waits for it.
//!
//! ## Components
//!
//! - [`NotificationPoller`]: injected capability that fetches notifications
//!   newer than a reference timestamp (an HTTP call in production).
//! - [`watch`]: one watcher polling for a single pattern until it matches,
//!   is cancelled, or its deadline passes.
//! - [`Verifier::race`]: runs one watcher per expected pattern and returns
//!   the first definitive [`Outcome`], cancelling the rest.
//! - [`Verifier::check_installed`]: single-pattern check where the absence
//!   of the notification is the negative signal.
//!
//! ## Invariants
//!
//! - A race delivers exactly one [`Outcome`], however many watchers match or
//!   time out concurrently.
//! - Notifications stamped before `since` never match.
//! - Transient poll errors never end a watch; only a match, cancellation or
//!   the deadline do.

mod cancel;
mod clock;
mod error;
mod install;
mod notification;
mod outcome;
mod race;
mod watcher;

pub use cancel::{CancelOnDrop, CancelSignal};
pub use clock::{Clock, SystemClock};
pub use error::VerifyError;
pub use notification::{Notification, NotificationPoller};
pub use outcome::{Outcome, OutcomeReceiver, OutcomeSink, TIMEOUT_MESSAGE};
pub use race::{Verifier, VerifierConfig};
pub use watcher::{watch, Expectation, WatchSpec};
