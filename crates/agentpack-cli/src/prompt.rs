//! Confirmation prompt for destructive commands.
//!
//! Uses dialoguer for the yes/no question and console for the summary.

use std::io::{self, Write};

use anyhow::Result;
use console::style;
use dialoguer::{Confirm, theme::ColorfulTheme};

use agentpack_core::config::{AgentpackConfig, StoreKind};

/// Summary and confirmation before a tenant is cleared.
pub struct ClearPrompt<W: Write = io::Stdout> {
    /// Skip the question and answer yes
    yes: bool,
    /// Output writer (for testing)
    writer: W,
    theme: ColorfulTheme,
}

impl ClearPrompt<io::Stdout> {
    pub fn new(yes: bool) -> Self {
        Self {
            yes,
            writer: io::stdout(),
            theme: ColorfulTheme::default(),
        }
    }
}

impl<W: Write> ClearPrompt<W> {
    #[cfg(test)]
    pub fn with_writer(yes: bool, writer: W) -> Self {
        Self {
            yes,
            writer,
            theme: ColorfulTheme::default(),
        }
    }

    /// Print what will be cleared and ask to proceed.
    pub fn confirm(&mut self, tenant: &str, config: &AgentpackConfig) -> Result<bool> {
        writeln!(self.writer)?;
        writeln!(self.writer, "{}", style("  Clear tenant").bold())?;
        writeln!(self.writer, "  ───────────────────────────")?;
        writeln!(self.writer, "  Tenant:   {}", style(tenant).yellow())?;
        writeln!(
            self.writer,
            "  Store:    {}",
            style(describe_store(config)).green()
        )?;
        writeln!(
            self.writer,
            "  Every live record of this tenant will be soft-deleted."
        )?;
        writeln!(self.writer)?;

        if self.yes {
            return Ok(true);
        }

        let confirmed = Confirm::with_theme(&self.theme)
            .with_prompt("Proceed with clear?")
            .default(false)
            .interact()?;

        Ok(confirmed)
    }
}

fn describe_store(config: &AgentpackConfig) -> String {
    match (config.store.kind, &config.store.url) {
        (Some(StoreKind::Http), Some(url)) => format!("http ({})", url),
        (Some(StoreKind::Http), None) => "http".to_string(),
        (Some(StoreKind::Memory), _) => "memory (not persisted)".to_string(),
        (None, _) => "not configured".to_string(),
    }
}
