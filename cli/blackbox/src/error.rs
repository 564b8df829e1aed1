//! Error display for the scenario runner.

use colored::Colorize;
use pcc_client::ClientError;
use pcc_verify::VerifyError;

use crate::ipmi::BmcError;

/// Print an error in a user-friendly format.
pub fn print_error(err: &anyhow::Error) {
    eprintln!("{} {:#}", "Error:".red().bold(), err);

    if let Some(hint) = hint(err) {
        eprintln!("\n{}", format!("Hint: {hint}").yellow());
    }
}

fn hint(err: &anyhow::Error) -> Option<&'static str> {
    for cause in err.chain() {
        if let Some(client_err) = cause.downcast_ref::<ClientError>() {
            return match client_err {
                ClientError::Api { status: 401, .. } => {
                    Some("The token was rejected. Set PCC_TOKEN or `token` in the test environment.")
                }
                ClientError::Api { status: 403, .. } => {
                    Some("The token may not have permission for this operation.")
                }
                ClientError::Network(_) => {
                    Some("Check your network connection and the PCC URL (PCC_URL).")
                }
                _ => None,
            };
        }
        if let Some(VerifyError::Timeout { .. }) = cause.downcast_ref::<VerifyError>() {
            return Some("No notification arrived in time. Timeouts are set under `timeouts` in the test environment.");
        }
        if let Some(BmcError::Spawn(_)) = cause.downcast_ref::<BmcError>() {
            return Some("Is ipmitool installed and on PATH?");
        }
    }
    None
}
