//! Pack document loading
//!
//! Packs are authored as JSON or TOML; the format is chosen by file
//! extension, defaulting to JSON.

use std::path::Path;

use anyhow::{Context, Result};

use super::schema::TemplatePack;
use crate::config::parser::enhance_toml_error;

/// Supported pack document formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackFormat {
    Json,
    Toml,
}

impl PackFormat {
    /// Detect the format from a file extension.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .as_deref()
        {
            Some("toml") => PackFormat::Toml,
            _ => PackFormat::Json,
        }
    }
}

/// Load a pack document from disk.
pub fn load_pack(path: &Path) -> Result<TemplatePack> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read pack file: {}", path.display()))?;

    parse_pack_str(&content, PackFormat::from_path(path))
        .with_context(|| format!("Failed to parse pack file: {}", path.display()))
}

/// Parse pack content in the given format.
pub fn parse_pack_str(content: &str, format: PackFormat) -> Result<TemplatePack> {
    match format {
        PackFormat::Json => serde_json::from_str(content).map_err(|e| {
            anyhow::anyhow!(
                "JSON parsing error at line {}, column {}: {}",
                e.line(),
                e.column(),
                e
            )
        }),
        PackFormat::Toml => toml::from_str(content).map_err(|e| enhance_toml_error(e, content)),
    }
}
