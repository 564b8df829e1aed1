//! Command line interface.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;

use crate::config::TestEnv;
use crate::context::TestContext;
use crate::scenarios;

/// Black-box scenarios against a PCC server.
#[derive(Debug, Parser)]
#[command(name = "pcc-blackbox")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Test environment file (JSON).
    #[arg(long, global = true, env = "PCC_BLACKBOX_CONFIG")]
    config: Option<PathBuf>,

    /// Log what would run without touching the server or BMCs.
    #[arg(long, global = true, env = "PCC_BLACKBOX_DRY_RUN")]
    dry_run: bool,

    /// Emit logs as JSON.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, Subcommand)]
enum Commands {
    /// PXE boot the first server and wait for it to be added.
    NodeAdd,

    /// Check hardware and storage inventory of the enrolled server.
    HwInventory,

    /// Upload registry key material, install Portus and wait for the
    /// installation to complete.
    Portus,

    /// Delete every Portus deployment.
    PortusDelete,

    /// Power cycle the first server.
    PowerCycle,

    /// Node add, inventory and Portus in sequence.
    All,
}

impl Cli {
    pub fn log_json(&self) -> bool {
        self.log_json
    }

    /// Run the selected scenarios.
    pub async fn run(self) -> Result<()> {
        let env = TestEnv::load(self.config.as_deref())?;

        if self.dry_run {
            info!(command = ?self.command, pcc_url = %env.pcc_url, "Dry run, skipping");
            return Ok(());
        }

        let ctx = TestContext::new(env)?;
        match self.command {
            Commands::NodeAdd => node_add(&ctx).await,
            Commands::HwInventory => hw_inventory(&ctx).await.map(|_| ()),
            Commands::Portus => portus(&ctx).await,
            Commands::PortusDelete => {
                let deleted = scenarios::delete_all_portus(&ctx).await?;
                info!(deleted, "Portus deployments deleted");
                Ok(())
            }
            Commands::PowerCycle => scenarios::power_cycle_node(&ctx).await,
            Commands::All => {
                node_add(&ctx).await?;
                hw_inventory(&ctx).await?;
                portus(&ctx).await
            }
        }
    }
}

async fn node_add(ctx: &TestContext) -> Result<()> {
    let since = ctx.verifier.now();
    scenarios::pxeboot_node(ctx).await?;
    scenarios::verify_add_node(ctx, since).await.map(|_| ())
}

async fn hw_inventory(ctx: &TestContext) -> Result<u64> {
    let node_id = scenarios::check_hardware_inventory(ctx).await?;
    scenarios::check_storage(ctx, node_id).await?;
    Ok(node_id)
}

async fn portus(ctx: &TestContext) -> Result<()> {
    scenarios::upload_registry_tls(ctx).await?;
    let since = ctx.verifier.now();
    let node_id = scenarios::install_portus(ctx).await?;
    scenarios::check_portus(ctx, node_id, since).await
}
