//! pcc-blackbox library
//!
//! Black-box integration scenarios for a PCC cluster-management server:
//! node enrollment over PXE, hardware and storage inventory, Portus
//! installation and removal, BMC power control.
//!
//! ## Modules
//!
//! - `config`: test environment file
//! - `context`: client, verifier and BMC access shared by scenarios
//! - `scenarios`: the scenarios themselves
//! - `ipmi`: `ipmitool` wrapper

pub mod cli;
pub mod config;
pub mod context;
pub mod error;
pub mod ipmi;
pub mod scenarios;

pub use cli::Cli;
pub use config::TestEnv;
pub use context::TestContext;
