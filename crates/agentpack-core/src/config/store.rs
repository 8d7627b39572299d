//! Config store for locating and loading agentpack.toml.

use std::path::{Path, PathBuf};

use super::{AgentpackConfig, parser, paths::resolve_config_path};

#[derive(Debug, Clone)]
pub struct ConfigStore {
    config_path: Option<PathBuf>,
}

impl ConfigStore {
    pub fn from_paths(explicit: Option<&Path>, global_dir: &Path, project_root: &Path) -> Self {
        Self {
            config_path: resolve_config_path(explicit, global_dir, project_root),
        }
    }

    /// Path that will be loaded, if any config file was found.
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// Load the config, falling back to defaults when no file exists.
    pub fn load(&self) -> anyhow::Result<AgentpackConfig> {
        match &self.config_path {
            Some(path) => {
                tracing::debug!(path = %path.display(), "loading config");
                parser::parse_config_toml(path)
            }
            None => Ok(AgentpackConfig::new()),
        }
    }
}
