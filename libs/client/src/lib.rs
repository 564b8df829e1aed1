//! # pcc-client
//!
//! Typed HTTP client for the PCC gateway.
//!
//! Every gateway response is wrapped in an envelope carrying its own
//! status, message and error next to the payload; [`PccClient`] unwraps it
//! and maps failures onto [`ClientError`].
//!
//! [`PccClient`] implements [`pcc_verify::NotificationPoller`] so it can be
//! handed straight to a [`pcc_verify::Verifier`].

mod client;
mod error;
mod interface;
mod types;

pub use client::{ClientConfig, PccClient};
pub use error::ClientError;
pub use types::*;
