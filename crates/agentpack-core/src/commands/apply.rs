//! Apply command implementation.
//!
//! Loads a pack, refuses it when validation fails, then runs the apply
//! engine against the configured (or in-memory) store.

use std::path::PathBuf;

use serde::Serialize;

use super::validate::ValidateCommand;
use crate::context::AppContext;
use crate::deploy::{ApplyEngine, DeploymentResult, ProgressReporter};
use crate::pack::ValidationReport;
use crate::store::{EntityStore, MemoryStore};

/// Options for the apply command
#[derive(Debug, Clone)]
pub struct ApplyOptions {
    /// Pack document to deploy
    pub pack_path: PathBuf,
    /// Target tenant; falls back to the configured default
    pub tenant: Option<String>,
    /// Apply against a throwaway in-memory store
    pub dry_run: bool,
    /// Apply even when validation fails
    pub skip_validation: bool,
}

impl ApplyOptions {
    pub fn new(pack_path: impl Into<PathBuf>) -> Self {
        Self {
            pack_path: pack_path.into(),
            tenant: None,
            dry_run: false,
            skip_validation: false,
        }
    }

    pub fn with_tenant(mut self, tenant: impl Into<String>) -> Self {
        self.tenant = Some(tenant.into());
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_skip_validation(mut self, skip: bool) -> Self {
        self.skip_validation = skip;
        self
    }
}

/// What the apply command did
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ApplyReport {
    /// Validation failed; nothing was written
    Rejected(ValidationReport),
    /// The engine ran
    Applied {
        result: DeploymentResult,
        dry_run: bool,
    },
}

/// Apply command executor
#[derive(Debug, Clone)]
pub struct ApplyCommand {
    ctx: AppContext,
}

impl ApplyCommand {
    pub fn new(ctx: AppContext) -> Self {
        Self { ctx }
    }

    pub fn with_defaults() -> anyhow::Result<Self> {
        Ok(Self::new(AppContext::with_defaults()?))
    }

    pub async fn execute(
        &self,
        options: &ApplyOptions,
        progress: &mut dyn ProgressReporter,
    ) -> anyhow::Result<ApplyReport> {
        let (pack, validation) = ValidateCommand::new().execute(&options.pack_path)?;
        if !validation.valid {
            if !options.skip_validation {
                return Ok(ApplyReport::Rejected(validation));
            }
            tracing::warn!("applying pack that failed validation");
        }

        let config = self.ctx.config()?;
        let tenant = self
            .ctx
            .resolve_tenant(options.tenant.as_deref(), &config)?;

        let store: Box<dyn EntityStore> = if options.dry_run {
            Box::new(MemoryStore::new())
        } else {
            self.ctx.entity_store(&config)?
        };

        let result = ApplyEngine::new(&*store)
            .apply(&pack, &tenant, progress)
            .await;

        Ok(ApplyReport::Applied {
            result,
            dry_run: options.dry_run,
        })
    }
}
