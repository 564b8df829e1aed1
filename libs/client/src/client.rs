//! HTTP client for the PCC gateway.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::multipart::{Form, Part};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, error};

use crate::error::ClientError;
use crate::types::{
    AuthProfile, Certificate, GatewayResponse, HardwareInventory, Node, PccNotification,
    PortusConfiguration, SecurityKey, StorageNode,
};

/// Gateway error text for a missing record.
const RECORD_NOT_FOUND: &str = "record not found";

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Gateway base URL, e.g. `https://pcc.example:9999`.
    pub base_url: String,

    /// Bearer token.
    pub token: Option<String>,

    pub request_timeout: Duration,

    /// PCC ships with a self-signed certificate.
    pub accept_invalid_certs: bool,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: None,
            request_timeout: Duration::from_secs(30),
            accept_invalid_certs: true,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }
}

/// PCC gateway client.
#[derive(Debug, Clone)]
pub struct PccClient {
    client: reqwest::Client,
    base_url: String,
}

impl PccClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(token) = &config.token {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|_| ClientError::InvalidConfig("invalid token format".to_string()))?;
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'))
    }

    /// Issue a gateway call and decode the envelope's `data`.
    pub(crate) async fn gateway<T, B>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&B>,
    ) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = self.url(endpoint);
        debug!(method = %method, url = %url, "PCC request");

        let mut request = self.client.request(method, &url);
        if let Some(body) = body {
            request = request.json(body);
        }
        self.send(request, endpoint).await
    }

    /// Send a prepared request and unwrap the gateway envelope.
    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        endpoint: &str,
    ) -> Result<T, ClientError> {
        let response = request.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        let envelope = parse_envelope(&bytes);

        if status == StatusCode::NOT_FOUND {
            return Err(ClientError::NotFound(endpoint.to_string()));
        }

        let Some(envelope) = envelope else {
            if !status.is_success() {
                let body = String::from_utf8_lossy(&bytes).into_owned();
                error!(status = %status, body = %body, "PCC request failed");
                return Err(ClientError::Api {
                    status: status.as_u16(),
                    message: body,
                });
            }
            if bytes.is_empty() {
                return Ok(serde_json::from_value(serde_json::Value::Null)?);
            }
            // Some endpoints answer with the bare payload.
            return Ok(serde_json::from_slice(&bytes)?);
        };

        let gateway_status = if envelope.status == 0 {
            status.as_u16()
        } else {
            envelope.status
        };

        if !status.is_success() || gateway_status != 200 {
            if envelope.error.contains(RECORD_NOT_FOUND)
                || envelope.message.contains(RECORD_NOT_FOUND)
            {
                return Err(ClientError::NotFound(endpoint.to_string()));
            }
            let message = if envelope.error.is_empty() {
                envelope.message
            } else {
                envelope.error
            };
            error!(status = gateway_status, message = %message, "PCC request failed");
            return Err(ClientError::Api {
                status: gateway_status,
                message,
            });
        }

        Ok(serde_json::from_value(envelope.data)?)
    }

    pub(crate) async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, ClientError> {
        self.gateway::<T, ()>(Method::GET, endpoint, None).await
    }

    /// Notifications created at or after `since`.
    pub async fn get_notifications(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<PccNotification>, ClientError> {
        let endpoint = format!(
            "pccserver/notifications/history?from={}",
            since.timestamp_millis()
        );
        let notifications: Vec<PccNotification> = self.get(&endpoint).await?;
        Ok(notifications
            .into_iter()
            .filter(|n| n.created_at >= since)
            .collect())
    }

    pub async fn get_nodes(&self) -> Result<Vec<Node>, ClientError> {
        self.get("pccserver/node").await
    }

    pub async fn get_node(&self, id: u64) -> Result<Node, ClientError> {
        self.get(&format!("pccserver/node/{id}")).await
    }

    pub async fn get_hardware_inventory(&self) -> Result<Vec<HardwareInventory>, ClientError> {
        self.get("pccserver/hardware-inventory").await
    }

    pub async fn get_storage_node(&self, node_id: u64) -> Result<StorageNode, ClientError> {
        self.get(&format!("pccserver/storage/node/{node_id}")).await
    }

    /// Request a Portus installation. Completion is signalled by a
    /// notification, not by this call.
    pub async fn install_portus(&self, config: &PortusConfiguration) -> Result<(), ClientError> {
        self.gateway::<serde_json::Value, _>(Method::POST, "pccserver/portus", Some(config))
            .await
            .map(|_| ())
    }

    pub async fn get_portus_nodes(&self) -> Result<Vec<PortusConfiguration>, ClientError> {
        self.get("pccserver/portus").await
    }

    pub async fn get_portus_node(&self, id: u64) -> Result<PortusConfiguration, ClientError> {
        self.get(&format!("pccserver/portus/{id}")).await
    }

    pub async fn delete_portus_node(&self, id: u64, force: bool) -> Result<(), ClientError> {
        let endpoint = format!("pccserver/portus/{id}?forceRemove={force}");
        self.gateway::<serde_json::Value, ()>(Method::DELETE, &endpoint, None)
            .await
            .map(|_| ())
    }

    pub async fn get_certificates(&self) -> Result<Vec<Certificate>, ClientError> {
        self.get("key-manager/certificates/describe").await
    }

    pub async fn find_certificate(&self, alias: &str) -> Result<Certificate, ClientError> {
        self.get_certificates()
            .await?
            .into_iter()
            .find(|c| c.alias == alias)
            .ok_or_else(|| ClientError::NotFound(format!("certificate {alias}")))
    }

    pub async fn get_security_keys(&self) -> Result<Vec<SecurityKey>, ClientError> {
        self.get("key-manager/keys/describe").await
    }

    pub async fn find_security_key(&self, alias: &str) -> Result<SecurityKey, ClientError> {
        self.get_security_keys()
            .await?
            .into_iter()
            .find(|k| k.alias == alias)
            .ok_or_else(|| ClientError::NotFound(format!("security key {alias}")))
    }

    /// Upload a PEM private key to the key manager under `alias`.
    pub async fn upload_security_key(
        &self,
        alias: &str,
        pem: Vec<u8>,
        description: &str,
    ) -> Result<(), ClientError> {
        let endpoint = format!("key-manager/keys/upload/private/{alias}");
        self.upload(&endpoint, alias, pem, description).await
    }

    /// Upload a PEM certificate to the key manager under `alias`.
    pub async fn upload_certificate(
        &self,
        alias: &str,
        pem: Vec<u8>,
        description: &str,
    ) -> Result<(), ClientError> {
        let endpoint = format!("key-manager/certificates/upload/{alias}");
        self.upload(&endpoint, alias, pem, description).await
    }

    async fn upload(
        &self,
        endpoint: &str,
        file_name: &str,
        contents: Vec<u8>,
        description: &str,
    ) -> Result<(), ClientError> {
        let url = self.url(endpoint);
        debug!(url = %url, bytes = contents.len(), "PCC upload");

        let form = Form::new()
            .part("file", Part::bytes(contents).file_name(file_name.to_string()))
            .text("description", description.to_string());

        self.send::<serde_json::Value>(self.client.post(&url).multipart(form), endpoint)
            .await
            .map(|_| ())
    }

    pub async fn get_auth_profiles(&self) -> Result<Vec<AuthProfile>, ClientError> {
        self.get("user-management/auth/profiles").await
    }

    pub async fn get_auth_profile_by_name(&self, name: &str) -> Result<AuthProfile, ClientError> {
        self.get_auth_profiles()
            .await?
            .into_iter()
            .find(|p| p.name == name)
            .ok_or_else(|| ClientError::NotFound(format!("authentication profile {name}")))
    }
}

/// Parse a gateway envelope; `None` when the body is not one.
fn parse_envelope(bytes: &[u8]) -> Option<GatewayResponse> {
    let value: serde_json::Value = serde_json::from_slice(bytes).ok()?;
    let object = value.as_object()?;
    if !object.contains_key("status") && !object.contains_key("data") {
        return None;
    }
    serde_json::from_value(value).ok()
}

#[async_trait]
impl pcc_verify::NotificationPoller for PccClient {
    type Error = ClientError;

    async fn poll_notifications(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<pcc_verify::Notification>, ClientError> {
        Ok(self
            .get_notifications(since)
            .await?
            .into_iter()
            .map(Into::into)
            .collect())
    }
}
