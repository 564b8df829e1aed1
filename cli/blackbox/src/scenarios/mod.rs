//! Test scenarios.
//!
//! Each scenario triggers an action on the PCC (or a BMC) and verifies the
//! result through the API or the notification stream. Scenarios that start
//! an asynchronous action take the `since` timestamp from the caller, so it
//! is captured before the action is triggered.

mod inventory;
mod node;
mod portus;

pub use inventory::{check_hardware_inventory, check_storage, select_inventory_node};
pub use node::{node_add_specs, power_cycle_node, pxeboot_node, verify_add_node, NODE_ADD_ACTION};
pub use portus::{
    check_portus, delete_all_portus, install_portus, select_portus_node, upload_registry_tls,
    PORTUS_CERT_ALIAS, PORTUS_KEY_ALIAS,
};
