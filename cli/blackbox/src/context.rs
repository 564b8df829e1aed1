//! Shared state handed to every scenario.

use std::sync::Arc;

use anyhow::{Context, Result};
use pcc_client::{ClientConfig, PccClient};
use pcc_verify::{Verifier, VerifierConfig};

use crate::config::TestEnv;
use crate::ipmi::{BmcController, Ipmitool};

/// Everything a scenario needs. Scenarios exchange selections (such as the
/// node a component was installed on) through return values, never through
/// this context.
pub struct TestContext {
    pub env: TestEnv,
    pub client: Arc<PccClient>,
    pub verifier: Verifier<PccClient>,
    pub bmc: Arc<dyn BmcController>,
}

impl TestContext {
    /// Build a context talking to the configured PCC with `ipmitool`.
    pub fn new(env: TestEnv) -> Result<Self> {
        let mut config = ClientConfig::new(env.pcc_url.clone());
        if let Some(token) = &env.token {
            config = config.with_token(token.clone());
        }
        let client = PccClient::new(&config).context("Failed to create PCC client")?;

        Ok(Self::with_parts(
            env,
            Arc::new(client),
            Arc::new(Ipmitool::default()),
        ))
    }

    pub fn with_parts(env: TestEnv, client: Arc<PccClient>, bmc: Arc<dyn BmcController>) -> Self {
        let verifier = Verifier::with_config(
            Arc::clone(&client),
            VerifierConfig {
                poll_interval: env.timeouts.poll_interval(),
            },
        );

        Self {
            env,
            client,
            verifier,
            bmc,
        }
    }
}
