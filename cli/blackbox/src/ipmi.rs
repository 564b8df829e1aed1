//! BMC power control over IPMI.

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info};

use crate::config::Server;

#[derive(Debug, Error)]
pub enum BmcError {
    #[error("failed to run ipmitool: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("ipmitool {command} on {host} exited with {status}: {output}")]
    Failed {
        host: String,
        command: String,
        status: String,
        output: String,
    },
}

/// Out-of-band control of a server.
#[async_trait]
pub trait BmcController: Send + Sync {
    /// Run one chassis command, e.g. `["chassis", "power", "cycle"]`.
    async fn chassis(&self, server: &Server, args: &[&str]) -> Result<String, BmcError>;

    /// Boot from the network on next start, then power cycle.
    async fn pxeboot(&self, server: &Server) -> Result<(), BmcError> {
        self.chassis(server, &["chassis", "bootdev", "pxe"]).await?;
        self.power_cycle(server).await
    }

    async fn power_cycle(&self, server: &Server) -> Result<(), BmcError> {
        self.chassis(server, &["chassis", "power", "cycle"])
            .await
            .map(|_| ())
    }
}

/// [`BmcController`] shelling out to `ipmitool -I lanplus`.
#[derive(Debug, Clone)]
pub struct Ipmitool {
    program: String,
}

impl Default for Ipmitool {
    fn default() -> Self {
        Self {
            program: "ipmitool".to_string(),
        }
    }
}

impl Ipmitool {
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn args(server: &Server, command: &[&str]) -> Vec<String> {
        let mut args: Vec<String> = [
            "-I",
            "lanplus",
            "-H",
            server.bmc_ip.as_str(),
            "-U",
            server.bmc_user.as_str(),
            "-P",
            server.bmc_password.as_str(),
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        args.extend(command.iter().map(|s| s.to_string()));
        args
    }
}

#[async_trait]
impl BmcController for Ipmitool {
    async fn chassis(&self, server: &Server, args: &[&str]) -> Result<String, BmcError> {
        let command = args.join(" ");
        debug!(host = %server.bmc_ip, command = %command, "Running ipmitool");

        let output = Command::new(&self.program)
            .args(Self::args(server, args))
            .output()
            .await?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(BmcError::Failed {
                host: server.bmc_ip.clone(),
                command,
                status: output.status.to_string(),
                output: format!("{}{}", stdout, stderr).trim().to_string(),
            });
        }

        info!(host = %server.bmc_ip, command = %command, "ipmitool succeeded");
        Ok(stdout)
    }
}
