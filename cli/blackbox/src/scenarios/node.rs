//! Node enrollment and power scenarios.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use pcc_verify::WatchSpec;
use tracing::info;

use crate::config::TestEnv;
use crate::context::TestContext;

pub const NODE_ADD_ACTION: &str = "nodeAdd";

/// PXE boot the first configured server so it enrolls itself.
pub async fn pxeboot_node(ctx: &TestContext) -> Result<()> {
    let server = ctx.env.first_server()?;
    info!(bmc_ip = %server.bmc_ip, "PXE booting server");
    ctx.bmc
        .pxeboot(server)
        .await
        .with_context(|| format!("PXE boot of {} failed", server.bmc_ip))
}

/// Watch specs racing node-add success against node-add failure.
pub fn node_add_specs(env: &TestEnv, since: DateTime<Utc>) -> Vec<WatchSpec> {
    let interval = env.timeouts.poll_interval();
    let timeout = env.timeouts.pxeboot();
    vec![
        WatchSpec::success(env.notifications.node_add.clone(), since)
            .poll_interval(interval)
            .timeout(timeout),
        WatchSpec::failure(env.notifications.node_add_failed.clone(), since)
            .poll_interval(interval)
            .timeout(timeout),
    ]
}

/// Wait for the node enrolled after `since` to be reported added.
///
/// Returns the server's notification text.
pub async fn verify_add_node(ctx: &TestContext, since: DateTime<Utc>) -> Result<String> {
    let message = ctx
        .verifier
        .verify(NODE_ADD_ACTION, node_add_specs(&ctx.env, since))
        .await
        .context("Node addition failed")?;
    info!(message = %message, "Node added");
    Ok(message)
}

pub async fn power_cycle_node(ctx: &TestContext) -> Result<()> {
    let server = ctx.env.first_server()?;
    info!(bmc_ip = %server.bmc_ip, "Power cycling server");
    ctx.bmc
        .power_cycle(server)
        .await
        .with_context(|| format!("Power cycle of {} failed", server.bmc_ip))
}
