//! Validate command implementation.

use std::path::Path;

use crate::pack::{TemplatePack, ValidationReport, load_pack, validate};

/// Loads a pack file and validates it.
#[derive(Debug, Default)]
pub struct ValidateCommand;

impl ValidateCommand {
    pub fn new() -> Self {
        Self
    }

    pub fn execute(&self, pack_path: &Path) -> anyhow::Result<(TemplatePack, ValidationReport)> {
        let pack = load_pack(pack_path)?;
        let report = validate(&pack);
        if !report.valid {
            tracing::warn!(
                pack = %pack_path.display(),
                errors = report.errors.len(),
                "pack failed validation"
            );
        }
        Ok((pack, report))
    }
}
