//! Request and response types of the PCC gateway.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Envelope wrapped around every gateway response.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct GatewayResponse {
    #[serde(default)]
    pub status: u16,

    #[serde(default)]
    pub message: String,

    #[serde(default)]
    pub error: String,

    #[serde(default)]
    pub data: Value,
}

/// Connection status reported for a node agent that is reachable.
pub const NODE_ONLINE: &str = "online";

/// Server-side notification as returned by the history endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PccNotification {
    #[serde(default)]
    pub id: u64,

    pub message: String,

    #[serde(default)]
    pub target_id: Option<u64>,

    #[serde(default)]
    pub level: Option<String>,

    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

impl From<PccNotification> for pcc_verify::Notification {
    fn from(n: PccNotification) -> Self {
        Self {
            text: n.message,
            timestamp: n.created_at,
            target_id: n.target_id,
        }
    }
}

/// A managed node (server or invader switch).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: u64,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub host: String,

    /// Invaders are switches; applications are never installed on them.
    #[serde(default)]
    pub invader: bool,

    #[serde(default)]
    pub node_availability_status: Option<NodeAvailability>,

    /// Only filled in by the single-node endpoint.
    #[serde(default)]
    pub interfaces: Vec<InterfaceDetail>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeAvailability {
    #[serde(default)]
    pub connection_status: String,
}

impl Node {
    pub fn is_online(&self) -> bool {
        self.node_availability_status
            .as_ref()
            .is_some_and(|a| a.connection_status == NODE_ONLINE)
    }
}

/// Administrative state of a network interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdminStatus {
    Up,
    Down,
}

impl AdminStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
        }
    }
}

/// A network interface as discovered on a node.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interface {
    pub id: i64,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub mac_address: String,

    #[serde(default)]
    pub admin_status: String,

    /// `ready`, `queued`, `updating`, `stale`, `offline` or `unknown`.
    #[serde(default)]
    pub intf_state: String,

    #[serde(flatten)]
    pub settings: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterfaceDetail {
    pub interface: Interface,

    #[serde(default)]
    pub remote_links_details: Vec<Value>,
}

/// Desired interface configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterfaceRequest {
    pub interface_id: i64,

    pub node_id: u64,

    #[serde(rename = "ifName")]
    pub name: String,

    pub ipv4_addresses: Vec<String>,

    pub ipv6_addresses: Vec<String>,

    /// `"true"` or `"false"`; the gateway takes a string.
    pub management: String,

    pub gateway: String,

    pub autoneg: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed: Option<u64>,

    pub fec_type: String,

    pub media_type: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub mtu: Option<u64>,

    pub admin_status: String,

    pub managed_by_pcc: bool,
}

/// Interface of `interfaces` with the given MAC address.
pub fn find_interface_by_mac<'a>(
    interfaces: &'a [InterfaceDetail],
    mac: &str,
) -> Option<&'a InterfaceDetail> {
    if mac.is_empty() {
        return None;
    }
    interfaces
        .iter()
        .find(|i| i.interface.mac_address.eq_ignore_ascii_case(mac))
}

/// Hardware inventory of a node, as persisted after enrollment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HardwareInventory {
    pub node_id: u64,

    #[serde(default)]
    pub bus: Bus,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Bus {
    #[serde(default)]
    pub bmc: Bmc,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Bmc {
    #[serde(default)]
    pub ipcfg: IpConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IpConfig {
    #[serde(default)]
    pub ipaddress: String,
}

impl HardwareInventory {
    pub fn bmc_address(&self) -> &str {
        &self.bus.bmc.ipcfg.ipaddress
    }
}

/// Storage inventory of a node.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageNode {
    #[serde(default)]
    pub children: Vec<Value>,
}

/// Portus (container registry) deployment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortusConfiguration {
    #[serde(default)]
    pub id: u64,

    #[serde(default)]
    pub node_id: u64,

    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registry_cert_id: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registry_key_id: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authentication_profile: Option<Value>,

    /// Remaining deployment settings, passed through untouched.
    #[serde(flatten)]
    pub settings: Map<String, Value>,
}

/// Certificate stored in the key manager.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Certificate {
    pub id: u64,

    #[serde(default)]
    pub alias: String,

    #[serde(default)]
    pub description: String,
}

/// Private key stored in the key manager.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityKey {
    pub id: u64,

    #[serde(default)]
    pub alias: String,

    #[serde(default)]
    pub description: String,
}

/// Authentication profile (LDAP and similar).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthProfile {
    pub id: u64,

    pub name: String,

    #[serde(flatten)]
    pub settings: Map<String, Value>,
}
