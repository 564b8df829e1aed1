//! Portus (container registry) scenarios.

use std::future::Future;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use pcc_client::{ClientError, Node, PccClient, PortusConfiguration};
use tracing::{debug, info, warn};

use crate::context::TestContext;

/// Key manager alias of the registry certificate.
pub const PORTUS_CERT_ALIAS: &str = "test_portus_crt";

/// Key manager alias of the registry private key.
pub const PORTUS_KEY_ALIAS: &str = "test_portus_key";

/// First online node that is not an invader, lowest id first.
pub fn select_portus_node(nodes: &[Node]) -> Option<&Node> {
    nodes
        .iter()
        .filter(|n| !n.invader && n.is_online())
        .min_by_key(|n| n.id)
}

/// Upload the registry key and certificate named in `registry_tls`.
///
/// Material already stored under its alias is left alone. Returns the
/// number of files uploaded.
pub async fn upload_registry_tls(ctx: &TestContext) -> Result<usize> {
    let tls = &ctx.env.registry_tls;
    let mut uploaded = 0;

    match &tls.key_file {
        None => info!("No registry key file configured, skipping upload"),
        Some(path) => {
            let existing = ctx.client.find_security_key(PORTUS_KEY_ALIAS).await.map(|k| k.id);
            let fresh = upload_if_missing("registry private key", PORTUS_KEY_ALIAS, path, existing, |pem| {
                ctx.client.upload_security_key(PORTUS_KEY_ALIAS, pem, "Portus registry private key")
            })
            .await?;
            uploaded += usize::from(fresh);
        }
    }

    match &tls.cert_file {
        None => info!("No registry certificate file configured, skipping upload"),
        Some(path) => {
            let existing = ctx.client.find_certificate(PORTUS_CERT_ALIAS).await.map(|c| c.id);
            let fresh = upload_if_missing("registry certificate", PORTUS_CERT_ALIAS, path, existing, |pem| {
                ctx.client.upload_certificate(PORTUS_CERT_ALIAS, pem, "Portus registry certificate")
            })
            .await?;
            uploaded += usize::from(fresh);
        }
    }

    Ok(uploaded)
}

async fn upload_if_missing<F, Fut>(
    what: &str,
    alias: &str,
    path: &Path,
    existing: Result<u64, ClientError>,
    upload: F,
) -> Result<bool>
where
    F: FnOnce(Vec<u8>) -> Fut,
    Fut: Future<Output = Result<(), ClientError>>,
{
    match existing {
        Ok(id) => {
            info!(alias, id, "{what} already uploaded");
            return Ok(false);
        }
        Err(e) if e.is_not_found() => {}
        Err(e) => return Err(anyhow::Error::new(e).context(format!("Failed to look up {what}"))),
    }

    let pem = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {what} from {}", path.display()))?;
    upload(pem)
        .await
        .with_context(|| format!("Failed to upload {what}"))?;

    info!(alias, path = %path.display(), "{what} uploaded");
    Ok(true)
}

async fn build_configuration(ctx: &TestContext, node: &Node) -> Result<PortusConfiguration> {
    let mut config = PortusConfiguration {
        node_id: node.id,
        name: format!("portus_{}", node.id),
        settings: ctx.env.portus.clone(),
        ..Default::default()
    };

    match &ctx.env.authentication_profile {
        None => info!("No authentication profile configured, installing Portus without it"),
        Some(name) => match ctx.client.get_auth_profile_by_name(name).await {
            Ok(profile) => {
                config.authentication_profile = Some(
                    serde_json::to_value(&profile)
                        .context("Failed to encode authentication profile")?,
                );
            }
            Err(e) => warn!(
                profile = %name,
                error = %e,
                "Authentication profile missing, installing Portus without it"
            ),
        },
    }

    match ctx.client.find_certificate(PORTUS_CERT_ALIAS).await {
        Ok(cert) => config.registry_cert_id = Some(cert.id),
        Err(e) => warn!(alias = PORTUS_CERT_ALIAS, error = %e, "Registry certificate not found"),
    }

    match ctx.client.find_security_key(PORTUS_KEY_ALIAS).await {
        Ok(key) => config.registry_key_id = Some(key.id),
        Err(e) => warn!(alias = PORTUS_KEY_ALIAS, error = %e, "Registry private key not found"),
    }

    Ok(config)
}

/// Request a Portus installation on a suitable node.
///
/// Returns the id of the node Portus is being installed on.
pub async fn install_portus(ctx: &TestContext) -> Result<u64> {
    let nodes = ctx.client.get_nodes().await.context("Failed to list nodes")?;
    let node = select_portus_node(&nodes)
        .ok_or_else(|| anyhow::anyhow!("No online server node available for Portus"))?;

    let config = build_configuration(ctx, node).await?;

    info!(node_id = node.id, name = %config.name, "Installing Portus");
    ctx.client
        .install_portus(&config)
        .await
        .context("Failed to install Portus")?;

    Ok(node.id)
}

/// Wait for the Portus installation on `node_id` requested after `since`.
pub async fn check_portus(ctx: &TestContext, node_id: u64, since: DateTime<Utc>) -> Result<()> {
    ctx.verifier
        .check_installed(
            Some(node_id),
            ctx.env.timeouts.portus(),
            &ctx.env.notifications.portus_installed,
            since,
        )
        .await
        .context("Portus installation has failed")?;

    info!(node_id, "Portus correctly installed");
    Ok(())
}

/// Delete every Portus deployment and wait for each to disappear.
///
/// Returns the number of deployments removed.
pub async fn delete_all_portus(ctx: &TestContext) -> Result<usize> {
    let deployments = ctx
        .client
        .get_portus_nodes()
        .await
        .context("Failed to get Portus nodes")?;

    for portus in &deployments {
        info!(id = portus.id, name = %portus.name, "Deleting Portus");
        ctx.client
            .delete_portus_node(portus.id, true)
            .await
            .with_context(|| format!("Failed to delete Portus {}", portus.name))?;

        wait_until_deleted(
            &ctx.client,
            portus,
            ctx.env.timeouts.portus_delete_poll(),
            ctx.env.timeouts.portus_delete(),
        )
        .await?;
    }

    Ok(deployments.len())
}

async fn wait_until_deleted(
    client: &PccClient,
    portus: &PortusConfiguration,
    poll: Duration,
    timeout: Duration,
) -> Result<()> {
    let mut ticker = tokio::time::interval(poll.max(Duration::from_millis(100)));

    let wait = async {
        loop {
            ticker.tick().await;
            match client.get_portus_node(portus.id).await {
                Err(e) if e.is_not_found() => return Ok(()),
                Err(e) => {
                    return Err(anyhow::Error::new(e)
                        .context(format!("Failed to get Portus {}", portus.name)))
                }
                Ok(_) => debug!(id = portus.id, "Portus still present"),
            }
        }
    };

    tokio::time::timeout(timeout, wait)
        .await
        .map_err(|_| anyhow::anyhow!("Timeout deleting Portus {}", portus.name))?
}
