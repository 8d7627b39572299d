//! Configuration schema for agentpack.toml

use serde::{Deserialize, Serialize};
use url::Url;

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentpackConfig {
    /// Tenant used when a command is not given `--tenant`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_tenant: Option<String>,

    #[serde(default)]
    pub store: StoreConfig,
}

impl AgentpackConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate configuration after parsing
    pub fn validate(&self) -> anyhow::Result<()> {
        if let Some(tenant) = &self.default_tenant
            && tenant.trim().is_empty()
        {
            anyhow::bail!("'default_tenant' must not be empty");
        }
        self.store.validate()
    }
}

/// Entity Store backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StoreKind {
    /// Process-local store; nothing is persisted
    Memory,
    /// Remote CRUD endpoint
    Http,
}

/// Entity Store connection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Backend to deploy into; unset means no store is configured
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<StoreKind>,

    /// Base URL of the CRUD endpoint (http only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<Url>,

    /// Environment variable holding the bearer token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_env: Option<String>,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            kind: None,
            url: None,
            token_env: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl StoreConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.timeout_secs == 0 {
            anyhow::bail!("'store.timeout_secs' must be greater than zero");
        }
        if self.kind == Some(StoreKind::Http) {
            let Some(url) = &self.url else {
                anyhow::bail!("HTTP store requires 'store.url'");
            };
            if !matches!(url.scheme(), "http" | "https") {
                anyhow::bail!("'store.url' must use http or https, got '{}'", url.scheme());
            }
        }
        if let Some(var) = &self.token_env
            && var.trim().is_empty()
        {
            anyhow::bail!("'store.token_env' must name an environment variable");
        }
        Ok(())
    }
}
