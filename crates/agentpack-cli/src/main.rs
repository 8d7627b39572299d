//! agentpack - template pack deployment
//!
//! Usage:
//!   agentpack validate pack.json
//!   agentpack apply pack.json --tenant acme
//!   agentpack clear --tenant acme
//!   agentpack inspect pack.toml

mod prompt;

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use console::style;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use agentpack_core::commands::{
    ApplyCommand, ApplyOptions, ApplyReport, ClearCommand, ClearOptions, ValidateCommand,
};
use agentpack_core::context::AppContext;
use agentpack_core::deploy::{ClearResult, Counts, DeploymentResult};
use agentpack_core::pack::{TemplatePack, ValidationReport, load_pack};
use agentpack_core::types::EntityKind;

use crate::prompt::ClearPrompt;

#[derive(Parser)]
#[command(name = "agentpack")]
#[command(about = "Deploy template packs of agents and playbooks", long_about = None)]
struct Cli {
    /// Config file to use instead of agentpack.toml discovery
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a pack's structure and references without touching the store
    Validate {
        /// Pack document (.json or .toml)
        pack: PathBuf,

        /// Output format
        #[arg(short = 'o', long, default_value = "table")]
        format: OutputFormat,
    },

    /// Create every entity of a pack for a tenant
    Apply(ApplyArgs),

    /// Soft-delete every live entity of a tenant
    Clear {
        /// Target tenant (defaults to 'default_tenant' from agentpack.toml)
        #[arg(long, short)]
        tenant: Option<String>,

        /// Skip the confirmation prompt (for CI/CD)
        #[arg(short = 'y', long)]
        yes: bool,

        /// Output format
        #[arg(short = 'o', long, default_value = "table")]
        format: OutputFormat,
    },

    /// Show what a pack declares
    Inspect {
        /// Pack document (.json or .toml)
        pack: PathBuf,

        /// Output format
        #[arg(short = 'o', long, default_value = "table")]
        format: OutputFormat,
    },
}

#[derive(Args)]
struct ApplyArgs {
    /// Pack document (.json or .toml)
    pack: PathBuf,
    /// Target tenant (defaults to 'default_tenant' from agentpack.toml)
    #[arg(long, short)]
    tenant: Option<String>,
    /// Apply against a throwaway in-memory store
    #[arg(long)]
    dry_run: bool,
    /// Apply even when validation fails
    #[arg(long)]
    skip_validation: bool,
    /// Output format
    #[arg(short = 'o', long, default_value = "table")]
    format: OutputFormat,
}

#[derive(Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    /// Human-readable table
    #[default]
    Table,
    /// Machine-readable JSON
    Json,
    /// No output (non-zero exit on failure)
    Quiet,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "agentpack=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let ctx = build_context(cli.config)?;

    let ok = match cli.command {
        Commands::Validate { pack, format } => run_validate(&pack, format)?,
        Commands::Apply(args) => run_apply(ctx, args).await?,
        Commands::Clear {
            tenant,
            yes,
            format,
        } => run_clear(ctx, tenant, yes, format).await?,
        Commands::Inspect { pack, format } => run_inspect(&pack, format)?,
    };

    if !ok {
        std::process::exit(1);
    }
    Ok(())
}

fn build_context(config: Option<PathBuf>) -> Result<AppContext> {
    let ctx = AppContext::with_defaults()?;
    Ok(match config {
        Some(path) => ctx.with_config_file(path),
        None => ctx,
    })
}

fn run_validate(pack: &Path, format: OutputFormat) -> Result<bool> {
    let (loaded, report) = ValidateCommand::new().execute(pack)?;

    match format {
        OutputFormat::Table => {
            if report.valid {
                println!(
                    "{} Pack '{}' is valid ({} specs)",
                    style("✓").green(),
                    loaded.metadata.key,
                    loaded.total_specs()
                );
            } else {
                print_validation_errors(&report);
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Quiet => {}
    }

    Ok(report.valid)
}

async fn run_apply(ctx: AppContext, args: ApplyArgs) -> Result<bool> {
    let mut options = ApplyOptions::new(&args.pack)
        .with_dry_run(args.dry_run)
        .with_skip_validation(args.skip_validation);
    if let Some(tenant) = &args.tenant {
        options = options.with_tenant(tenant);
    }

    let show_progress = matches!(args.format, OutputFormat::Table);
    let mut progress = |label: &str, fraction: f64| {
        tracing::debug!(stage = label, fraction, "apply progress");
        if show_progress {
            print_progress(label, fraction);
        }
    };

    let report = ApplyCommand::new(ctx)
        .execute(&options, &mut progress)
        .await?;

    let ok = match &report {
        ApplyReport::Rejected(validation) => {
            if matches!(args.format, OutputFormat::Table) {
                print_validation_errors(validation);
                println!("Nothing was applied. Fix the pack or pass --skip-validation.");
            }
            false
        }
        ApplyReport::Applied { result, dry_run } => {
            if matches!(args.format, OutputFormat::Table) {
                print_deployment(result, *dry_run);
            }
            result.success
        }
    };

    if matches!(args.format, OutputFormat::Json) {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    Ok(ok)
}

async fn run_clear(
    ctx: AppContext,
    tenant: Option<String>,
    yes: bool,
    format: OutputFormat,
) -> Result<bool> {
    let mut options = ClearOptions::new();
    if let Some(tenant) = tenant {
        options = options.with_tenant(tenant);
    }

    let command = ClearCommand::new(ctx.clone());
    let target = command.target_tenant(&options)?;

    if matches!(format, OutputFormat::Table) {
        if !ClearPrompt::new(yes).confirm(&target, &ctx.config()?)? {
            println!("Clear cancelled.");
            return Ok(true);
        }
    } else if !yes {
        anyhow::bail!("Pass --yes to clear tenant '{}' without the prompt", target);
    }

    let show_progress = matches!(format, OutputFormat::Table);
    let mut progress = |label: &str, fraction: f64| {
        if show_progress {
            print_progress(label, fraction);
        }
    };

    let result = command.execute(&options, &mut progress).await?;

    match format {
        OutputFormat::Table => print_clear(&result),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        OutputFormat::Quiet => {}
    }

    Ok(result.success)
}

fn run_inspect(pack: &Path, format: OutputFormat) -> Result<bool> {
    let loaded = load_pack(pack)?;

    match format {
        OutputFormat::Table => print_inspect(&loaded),
        OutputFormat::Json => {
            let counts: serde_json::Map<String, serde_json::Value> = EntityKind::APPLY_ORDER
                .iter()
                .map(|kind| (kind.table().to_string(), loaded.spec_count(*kind).into()))
                .collect();
            let output = serde_json::json!({
                "key": loaded.metadata.key,
                "name": loaded.metadata.name,
                "version": loaded.metadata.version,
                "description": loaded.metadata.description,
                "specs": counts,
                "total": loaded.total_specs(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Quiet => {}
    }

    Ok(true)
}

fn print_progress(label: &str, fraction: f64) {
    println!(
        "{} {}",
        style(format!("[{:>3.0}%]", fraction * 100.0)).dim(),
        label
    );
}

fn print_validation_errors(report: &ValidationReport) {
    println!(
        "{} Pack is invalid ({} errors):",
        style("✗").red(),
        report.errors.len()
    );
    for error in &report.errors {
        println!("  - {}", error);
    }
}

fn print_counts(counts: &Counts) {
    for (kind, count) in counts.iter() {
        if count > 0 {
            println!("  {:<20} {}", kind.plural(), count);
        }
    }
}

fn print_errors(errors: &[String]) {
    if errors.is_empty() {
        return;
    }
    println!("Errors ({}):", errors.len());
    for error in errors {
        println!("  {} {}", style("⚠").yellow(), error);
    }
}

fn print_deployment(result: &DeploymentResult, dry_run: bool) {
    println!();
    let mode = if dry_run { " (dry run)" } else { "" };
    if result.success {
        println!(
            "{} Applied '{}' to tenant '{}'{}",
            style("✓").green(),
            result.pack_key,
            result.tenant_id,
            mode
        );
    } else {
        println!(
            "{} Applied '{}' to tenant '{}' with errors{}",
            style("✗").red(),
            result.pack_key,
            result.tenant_id,
            mode
        );
    }
    print_counts(&result.counts);
    println!("Summary: {} entities created", result.counts.total());
    print_errors(&result.errors);
}

fn print_clear(result: &ClearResult) {
    println!();
    if result.success {
        println!("{} Cleared tenant '{}'", style("✓").green(), result.tenant_id);
    } else {
        println!(
            "{} Cleared tenant '{}' with errors",
            style("✗").red(),
            result.tenant_id
        );
    }
    if result.counts.is_zero() {
        println!("No live records found.");
    } else {
        print_counts(&result.counts);
        println!("Summary: {} entities deleted", result.counts.total());
    }
    print_errors(&result.errors);
}

fn print_inspect(pack: &TemplatePack) {
    println!("Pack: {} ({})", pack.metadata.name, pack.metadata.key);
    if let Some(version) = &pack.metadata.version {
        println!("Version: {}", version);
    }
    if let Some(description) = &pack.metadata.description {
        println!("Description: {}", description);
    }
    println!();
    for kind in EntityKind::APPLY_ORDER {
        println!("  {:<20} {}", kind.plural(), pack.spec_count(kind));
    }
    println!("Summary: {} specs", pack.total_specs());
}
