//! Hardware and storage inventory scenarios.

use anyhow::{Context, Result};
use pcc_client::HardwareInventory;
use tracing::info;

use crate::config::Server;
use crate::context::TestContext;

/// Node id of the first inventory entry whose BMC address belongs to one of
/// `servers`.
pub fn select_inventory_node(servers: &[Server], inventory: &[HardwareInventory]) -> Option<u64> {
    servers.iter().find_map(|server| {
        inventory
            .iter()
            .find(|hw| hw.bmc_address() == server.bmc_ip)
            .map(|hw| hw.node_id)
    })
}

/// Check that an enrolled server's hardware inventory was persisted.
///
/// Returns the node id the inventory belongs to.
pub async fn check_hardware_inventory(ctx: &TestContext) -> Result<u64> {
    let inventory = ctx
        .client
        .get_hardware_inventory()
        .await
        .context("GetHardwareInventory failed")?;

    let node_id = select_inventory_node(&ctx.env.servers, &inventory).ok_or_else(|| {
        anyhow::anyhow!("Hardware inventory for the configured servers was not persisted")
    })?;

    info!(node_id, "Hardware inventory persisted");
    Ok(node_id)
}

/// Check that storage inventory exists for `node_id`. Returns the number of
/// top-level devices.
pub async fn check_storage(ctx: &TestContext, node_id: u64) -> Result<usize> {
    let storage = ctx
        .client
        .get_storage_node(node_id)
        .await
        .with_context(|| format!("GetStorageNode failed for node {node_id}"))?;

    if storage.children.is_empty() {
        anyhow::bail!("Storage inventory for node {node_id} was not persisted");
    }

    info!(node_id, devices = storage.children.len(), "Storage inventory persisted");
    Ok(storage.children.len())
}
