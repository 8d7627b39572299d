//! Configuration loading
//!
//! `agentpack.toml` is looked up in this order:
//! - an explicit `--config` path
//! - the project root
//! - the global config directory

pub mod parser;
pub mod paths;
pub mod schema;
pub mod store;

pub use parser::{parse_config_toml, parse_config_toml_str};
pub use paths::{CONFIG_FILE_NAME, default_global_dir, resolve_config_path};
pub use schema::{AgentpackConfig, StoreConfig, StoreKind};
pub use store::ConfigStore;
