//! Test environment configuration.
//!
//! Handles:
//! - PCC endpoint and credentials
//! - Servers under test and their BMC access
//! - Action timeouts and expected notification texts

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Test environment file name.
const TEST_ENV_FILE: &str = "test_env.json";

/// Get the default config directory path.
fn config_dir() -> Result<PathBuf> {
    ProjectDirs::from("com", "platina", "pcc-blackbox")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))
}

/// Description of the environment the scenarios run against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestEnv {
    /// PCC gateway URL.
    #[serde(default = "default_pcc_url")]
    pub pcc_url: String,

    /// Bearer token for the gateway.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Bare-metal servers available for enrollment.
    #[serde(default)]
    pub servers: Vec<Server>,

    /// Portus settings template; node and name are filled in per install.
    #[serde(default)]
    pub portus: Map<String, Value>,

    /// Authentication profile to attach to Portus, by name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authentication_profile: Option<String>,

    /// Registry key material uploaded before Portus is installed.
    #[serde(default)]
    pub registry_tls: RegistryTls,

    #[serde(default)]
    pub timeouts: Timeouts,

    #[serde(default)]
    pub notifications: NotificationPatterns,
}

fn default_pcc_url() -> String {
    "https://127.0.0.1:9999".to_string()
}

impl Default for TestEnv {
    fn default() -> Self {
        Self {
            pcc_url: default_pcc_url(),
            token: None,
            servers: Vec::new(),
            portus: Map::new(),
            authentication_profile: None,
            registry_tls: RegistryTls::default(),
            timeouts: Timeouts::default(),
            notifications: NotificationPatterns::default(),
        }
    }
}

/// A server reachable through its BMC.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Server {
    pub bmc_ip: String,

    #[serde(default = "default_bmc_credential")]
    pub bmc_user: String,

    #[serde(default = "default_bmc_credential")]
    pub bmc_password: String,
}

fn default_bmc_credential() -> String {
    "ADMIN".to_string()
}

/// PEM files for the Portus registry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryTls {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_file: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cert_file: Option<PathBuf>,
}

/// Timeouts for asynchronous actions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    pub pxeboot_secs: u64,
    pub portus_secs: u64,
    pub portus_delete_secs: u64,
    pub portus_delete_poll_secs: u64,
    pub poll_interval_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            pxeboot_secs: 1200,
            portus_secs: 600,
            portus_delete_secs: 600,
            portus_delete_poll_secs: 30,
            poll_interval_ms: 5000,
        }
    }
}

impl Timeouts {
    pub fn pxeboot(&self) -> Duration {
        Duration::from_secs(self.pxeboot_secs)
    }

    pub fn portus(&self) -> Duration {
        Duration::from_secs(self.portus_secs)
    }

    pub fn portus_delete(&self) -> Duration {
        Duration::from_secs(self.portus_delete_secs)
    }

    pub fn portus_delete_poll(&self) -> Duration {
        Duration::from_secs(self.portus_delete_poll_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Notification texts that mark the end of an action.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationPatterns {
    pub node_add: String,
    pub node_add_failed: String,
    pub portus_installed: String,
}

impl Default for NotificationPatterns {
    fn default() -> Self {
        Self {
            node_add: "Node added successfully".to_string(),
            node_add_failed: "Node add failed".to_string(),
            portus_installed: "Portus installed successfully".to_string(),
        }
    }
}

impl TestEnv {
    /// Load the test environment.
    ///
    /// An explicit `path` must exist. Without one, the default location is
    /// tried and defaults are used if it is absent. `PCC_URL` and
    /// `PCC_TOKEN` override the file.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut env = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let path = config_dir()?.join(TEST_ENV_FILE);
                if path.exists() {
                    Self::from_file(&path)?
                } else {
                    Self::default()
                }
            }
        };
        env.apply_overrides(|key| std::env::var(key).ok());
        Ok(env)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read test environment from {:?}", path))?;

        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse test environment from {:?}", path))
    }

    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("PCC_URL") {
            self.pcc_url = url;
        }
        if let Some(token) = lookup("PCC_TOKEN") {
            self.token = Some(token);
        }
    }

    /// The server used for enrollment and power scenarios.
    pub fn first_server(&self) -> Result<&Server> {
        self.servers
            .first()
            .ok_or_else(|| anyhow::anyhow!("No servers defined in the test environment"))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_defaults() {
        let env = TestEnv::default();
        assert!(!env.pcc_url.is_empty());
        assert_eq!(env.timeouts.pxeboot(), Duration::from_secs(1200));
        assert!(env.first_server().is_err());
    }

    #[test]
    fn test_from_file_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "pcc_url": "https://pcc.lab:9999",
                "servers": [{{ "bmc_ip": "10.0.0.5" }}],
                "timeouts": {{ "portus_secs": 60 }},
                "notifications": {{ "portus_installed": "Portus ready" }},
                "registry_tls": {{ "cert_file": "/etc/pcc/portus.crt" }}
            }}"#
        )
        .unwrap();

        let env = TestEnv::from_file(file.path()).unwrap();
        let server = env.first_server().unwrap();
        assert_eq!(server.bmc_ip, "10.0.0.5");
        assert_eq!(server.bmc_user, "ADMIN");
        assert_eq!(env.timeouts.portus(), Duration::from_secs(60));
        assert_eq!(env.timeouts.pxeboot_secs, 1200);
        assert_eq!(env.notifications.portus_installed, "Portus ready");
        assert_eq!(env.notifications.node_add, "Node added successfully");
        assert_eq!(
            env.registry_tls.cert_file.as_deref(),
            Some(Path::new("/etc/pcc/portus.crt"))
        );
        assert!(env.registry_tls.key_file.is_none());
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = TestEnv::load(Some(&dir.path().join("nope.json"))).unwrap_err();
        assert!(err.to_string().contains("Failed to read test environment"));
    }

    #[test]
    fn test_overrides() {
        let mut env = TestEnv::default();
        env.apply_overrides(|key| match key {
            "PCC_URL" => Some("https://other:9999".to_string()),
            "PCC_TOKEN" => Some("t0k3n".to_string()),
            _ => None,
        });
        assert_eq!(env.pcc_url, "https://other:9999");
        assert_eq!(env.token.as_deref(), Some("t0k3n"));
    }
}
