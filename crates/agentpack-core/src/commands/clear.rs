//! Clear command implementation.

use crate::context::AppContext;
use crate::deploy::{ClearEngine, ClearResult, ProgressReporter};

/// Options for the clear command
#[derive(Debug, Clone, Default)]
pub struct ClearOptions {
    /// Target tenant; falls back to the configured default
    pub tenant: Option<String>,
}

impl ClearOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tenant(mut self, tenant: impl Into<String>) -> Self {
        self.tenant = Some(tenant.into());
        self
    }
}

/// Clear command executor
#[derive(Debug, Clone)]
pub struct ClearCommand {
    ctx: AppContext,
}

impl ClearCommand {
    pub fn new(ctx: AppContext) -> Self {
        Self { ctx }
    }

    pub fn with_defaults() -> anyhow::Result<Self> {
        Ok(Self::new(AppContext::with_defaults()?))
    }

    /// Tenant the command would clear, for confirmation prompts.
    ///
    /// Fails the same way `execute` would when no store is configured.
    pub fn target_tenant(&self, options: &ClearOptions) -> anyhow::Result<String> {
        let config = self.ctx.config()?;
        self.ctx.store_kind(&config)?;
        self.ctx.resolve_tenant(options.tenant.as_deref(), &config)
    }

    pub async fn execute(
        &self,
        options: &ClearOptions,
        progress: &mut dyn ProgressReporter,
    ) -> anyhow::Result<ClearResult> {
        let config = self.ctx.config()?;
        let tenant = self
            .ctx
            .resolve_tenant(options.tenant.as_deref(), &config)?;
        let store = self.ctx.entity_store(&config)?;

        Ok(ClearEngine::new(&*store)
            .clear(&tenant, progress)
            .await)
    }
}
