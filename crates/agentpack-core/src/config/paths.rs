//! Config path resolution helpers.

use std::path::{Path, PathBuf};

/// File name looked up in the project root and the global config directory.
pub const CONFIG_FILE_NAME: &str = "agentpack.toml";

/// Locate the config file to load.
///
/// An explicit path always wins. Otherwise the project file shadows the
/// global one; `None` means neither exists.
pub fn resolve_config_path(
    explicit: Option<&Path>,
    global_dir: &Path,
    project_root: &Path,
) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    [project_root.join(CONFIG_FILE_NAME), global_dir.join(CONFIG_FILE_NAME)]
        .into_iter()
        .find(|path| path.exists())
}

/// Default global config directory (`<config_dir>/agentpack`).
pub fn default_global_dir(home_dir: &Path) -> PathBuf {
    dirs::config_dir()
        .map(|p| p.join("agentpack"))
        .unwrap_or_else(|| home_dir.join(".config").join("agentpack"))
}
