//! Application context for unified dependency injection.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;

use crate::config::{AgentpackConfig, ConfigStore, StoreKind, default_global_dir};
use crate::store::{EntityStore, HttpStore, MemoryStore};

/// Unified application context for dependency injection.
///
/// Frontends create this once, then ask it for the config and a store.
#[derive(Debug, Clone)]
pub struct AppContext {
    project_root: PathBuf,
    global_config_dir: PathBuf,
    explicit_config: Option<PathBuf>,
}

impl AppContext {
    /// Create a new context with explicit paths.
    pub fn new(home_dir: PathBuf, project_root: PathBuf) -> Self {
        let global_config_dir = default_global_dir(&home_dir);
        Self {
            project_root,
            global_config_dir,
            explicit_config: None,
        }
    }

    /// Create context with custom global config directory (for testing).
    pub fn with_global_config_dir(project_root: PathBuf, global_config_dir: PathBuf) -> Self {
        Self {
            project_root,
            global_config_dir,
            explicit_config: None,
        }
    }

    /// Context rooted at the current directory and the user's home.
    pub fn with_defaults() -> anyhow::Result<Self> {
        let home_dir =
            dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))?;
        let project_root = std::env::current_dir().context("Failed to read current directory")?;
        Ok(Self::new(home_dir, project_root))
    }

    /// Load config from `path` instead of searching for it.
    pub fn with_config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.explicit_config = Some(path.into());
        self
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn global_config_dir(&self) -> &Path {
        &self.global_config_dir
    }

    pub fn config_store(&self) -> ConfigStore {
        ConfigStore::from_paths(
            self.explicit_config.as_deref(),
            &self.global_config_dir,
            &self.project_root,
        )
    }

    pub fn config(&self) -> anyhow::Result<AgentpackConfig> {
        self.config_store().load()
    }

    /// The configured store backend. There is no implicit default.
    pub fn store_kind(&self, config: &AgentpackConfig) -> anyhow::Result<StoreKind> {
        config.store.kind.ok_or_else(|| {
            anyhow::anyhow!(
                "No Entity Store configured. Set 'kind' under [store] in agentpack.toml, or pass --dry-run to apply"
            )
        })
    }

    /// Build the Entity Store described by `config`.
    pub fn entity_store(&self, config: &AgentpackConfig) -> anyhow::Result<Box<dyn EntityStore>> {
        match self.store_kind(config)? {
            StoreKind::Memory => Ok(Box::new(MemoryStore::new())),
            StoreKind::Http => {
                let url = config
                    .store
                    .url
                    .clone()
                    .ok_or_else(|| anyhow::anyhow!("HTTP store requires 'store.url'"))?;
                let mut store =
                    HttpStore::new(url, Duration::from_secs(config.store.timeout_secs))
                        .context("Failed to create HTTP store")?;
                if let Some(var) = &config.store.token_env {
                    let token = std::env::var(var).with_context(|| {
                        format!("Store token variable '{}' is not set", var)
                    })?;
                    store = store.with_token(token);
                }
                Ok(Box::new(store))
            }
        }
    }

    /// Pick the tenant from an explicit value or the configured default.
    pub fn resolve_tenant(
        &self,
        explicit: Option<&str>,
        config: &AgentpackConfig,
    ) -> anyhow::Result<String> {
        explicit
            .map(str::to_string)
            .or_else(|| config.default_tenant.clone())
            .filter(|tenant| !tenant.trim().is_empty())
            .ok_or_else(|| {
                anyhow::anyhow!("No tenant given. Pass --tenant or set 'default_tenant' in agentpack.toml")
            })
    }
}
