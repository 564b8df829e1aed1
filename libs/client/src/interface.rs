//! Network interface management.

use reqwest::Method;
use serde_json::json;

use crate::client::PccClient;
use crate::error::ClientError;
use crate::types::{AdminStatus, InterfaceDetail, InterfaceRequest};

impl PccClient {
    /// Interfaces of `node_id`, as reported with the node.
    pub async fn get_ifaces_by_node_id(
        &self,
        node_id: u64,
    ) -> Result<Vec<InterfaceDetail>, ClientError> {
        Ok(self.get_node(node_id).await?.interfaces)
    }

    pub async fn get_iface_by_id(
        &self,
        node_id: u64,
        iface_id: i64,
    ) -> Result<InterfaceDetail, ClientError> {
        self.get_ifaces_by_node_id(node_id)
            .await?
            .into_iter()
            .find(|i| i.interface.id == iface_id)
            .ok_or_else(|| ClientError::NotFound(format!("interface {iface_id} on node {node_id}")))
    }

    /// Store the desired configuration of an interface. Takes effect on
    /// [`apply_iface`](Self::apply_iface).
    pub async fn set_iface(&self, request: &InterfaceRequest) -> Result<(), ClientError> {
        self.gateway::<serde_json::Value, _>(Method::POST, "pccserver/interface", Some(request))
            .await
            .map(|_| ())
    }

    /// Push the stored interface configuration to the node.
    pub async fn apply_iface(&self, node_id: u64) -> Result<(), ClientError> {
        let body = json!({ "nodeId": node_id });
        self.gateway::<serde_json::Value, _>(
            Method::POST,
            "pccserver/interface/apply",
            Some(&body),
        )
        .await
        .map(|_| ())
    }

    /// Bring an interface administratively up or down.
    pub async fn set_iface_admin(
        &self,
        node_id: u64,
        iface_id: i64,
        status: AdminStatus,
    ) -> Result<(), ClientError> {
        let request = InterfaceRequest {
            interface_id: iface_id,
            node_id,
            admin_status: status.as_str().to_string(),
            ..Default::default()
        };
        let endpoint = format!("pccserver/interface/{}", status.as_str());
        self.gateway::<serde_json::Value, _>(Method::POST, &endpoint, Some(&request))
            .await
            .map(|_| ())
    }
}
