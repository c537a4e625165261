use clap::{Parser, Subcommand};
use colored::Colorize;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use starschema_core::{DwhConfig, RunReport, StatementKind};
use starschema_sql::{LintDialect, LintOutcome, QueryCatalog, StatementLinter};
use starschema_engine::{Pipeline, PipelineError, Stage};
use starschema_warehouse::RedshiftWarehouse;

const DEFAULT_CONFIG: &str = "dwh.cfg";

/// starschema - star-schema warehouse ETL for the song play event log
#[derive(Parser)]
#[command(name = "starschema")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file (default: dwh.cfg)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the statement catalog
    Render {
        /// Only print one list (drop_schemas, create_schemas, drop_tables, create_tables, copy, insert)
        #[arg(short, long)]
        kind: Option<StatementKind>,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Parse every statement and report the ones that do not parse
    Lint {
        /// SQL dialect (redshift, postgres, generic)
        #[arg(short, long, default_value = "redshift")]
        dialect: LintDialect,
    },

    /// Drop and recreate schemas and tables
    Setup {
        #[command(flatten)]
        exec: ExecArgs,
    },

    /// Load staging tables and populate fact/dimension tables
    Etl {
        #[command(flatten)]
        exec: ExecArgs,
    },

    /// Setup followed by etl
    Run {
        #[command(flatten)]
        exec: ExecArgs,
    },
}

#[derive(clap::Args)]
struct ExecArgs {
    /// Connect with TLS
    #[arg(long)]
    tls: bool,

    /// Write a JSON run report to this file
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // .env may carry DWH_DB_PASSWORD
    dotenvy::dotenv().ok();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    let config_path = cli.config.clone().unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG));
    let config = DwhConfig::from_file(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    if cli.verbose {
        eprintln!("{} {}", "Loaded config from".cyan(), config_path.display());
    }

    let catalog = QueryCatalog::new(&config);
    tracing::info!(config = %config_path.display(), statements = catalog.len(), "catalog ready");

    match cli.command {
        Commands::Render { kind, json } => render_command(&catalog, kind, json),
        Commands::Lint { dialect } => lint_command(&catalog, dialect),
        Commands::Setup { exec } => run_command(&config, &catalog, Stage::Setup, &exec, cli.verbose).await,
        Commands::Etl { exec } => run_command(&config, &catalog, Stage::Load, &exec, cli.verbose).await,
        Commands::Run { exec } => run_command(&config, &catalog, Stage::All, &exec, cli.verbose).await,
    }
}

/// Render command - print statements
fn render_command(catalog: &QueryCatalog, kind: Option<StatementKind>, json: bool) -> Result<()> {
    if json {
        let output = match kind {
            Some(kind) => serde_json::to_string_pretty(catalog.list(kind))?,
            None => catalog.to_json()?,
        };
        println!("{}", output);
        return Ok(());
    }

    for (list_kind, statements) in catalog.iter() {
        if kind.is_some_and(|k| k != list_kind) {
            continue;
        }

        println!("{}", format!("-- {} ({})", list_kind, statements.len()).bright_blue());
        for sql in statements {
            println!("{};\n", sql);
        }
    }

    Ok(())
}

/// Lint command - parse catalog statements
fn lint_command(catalog: &QueryCatalog, dialect: LintDialect) -> Result<()> {
    let report = StatementLinter::from_dialect(dialect).lint(catalog);

    for finding in &report.findings {
        match &finding.outcome {
            LintOutcome::Ok => println!("  {} {}[{}]", "✓".green(), finding.kind, finding.index),
            LintOutcome::Skipped { reason } => {
                println!("  {} {}[{}] {}", "-".yellow(), finding.kind, finding.index, reason.dimmed())
            }
            LintOutcome::Failed { message } => {
                println!("  {} {}[{}] {}", "✗".red(), finding.kind, finding.index, message.red())
            }
        }
    }

    let failed = report.failures().count();
    println!();
    println!(
        "{} checked, {} skipped, {} failed",
        report.checked(),
        report.skipped(),
        if failed > 0 { failed.to_string().red() } else { failed.to_string().green() }
    );

    if report.has_failures() {
        std::process::exit(1);
    }

    Ok(())
}

/// Setup/etl/run commands - execute against the cluster
async fn run_command(
    config: &DwhConfig,
    catalog: &QueryCatalog,
    stage: Stage,
    exec: &ExecArgs,
    verbose: bool,
) -> Result<()> {
    let cluster = config.require_cluster()?;

    let warehouse = if exec.tls {
        RedshiftWarehouse::connect_with_tls(cluster).await?
    } else {
        RedshiftWarehouse::connect(cluster).await?
    };

    if verbose {
        eprintln!(
            "{} {}:{}/{}",
            "Connected to".cyan(),
            warehouse.host(),
            warehouse.port(),
            warehouse.database()
        );
    }

    let result = Pipeline::new(catalog, &warehouse).run(stage).await;

    let report = match &result {
        Ok(report) => Some(report),
        Err(e) => e.report(),
    };

    if let Some(report) = report {
        print_run_summary(report);

        if let Some(path) = &exec.output {
            save_report(report, path)?;
            if verbose {
                eprintln!("{} {}", "Report saved to:".green(), path.display());
            }
        }
    }

    match result {
        Ok(_) => Ok(()),
        Err(PipelineError::StatementFailed { kind, index, source, .. }) => {
            eprintln!("{} {}[{}]: {}", "✗ Failed".red().bold(), kind, index, source);
            if !kind.is_idempotent() {
                eprintln!(
                    "{}",
                    "Tables may hold partially loaded rows; run setup before retrying.".yellow()
                );
            }
            std::process::exit(1);
        }
        Err(e) => Err(e.into()),
    }
}

fn save_report(report: &RunReport, path: &Path) -> Result<()> {
    report
        .save_to_file(path)
        .with_context(|| format!("Failed to write report to {}", path.display()))
}

fn print_run_summary(report: &RunReport) {
    println!("\n{}", "=".repeat(60).bright_blue());
    println!("{} {}", "Stage:".bold(), report.stage);
    println!("{}", "=".repeat(60).bright_blue());

    for kind in StatementKind::ALL {
        let count = report.count(kind);
        if count > 0 {
            println!("  {:<16} {} statements", kind.as_str(), count);
        }
    }

    println!();
    println!("{} {}", "Rows affected:".bold(), report.total_rows());
    println!("{} {} ms", "Elapsed:".bold(), report.total_elapsed_ms());

    if report.succeeded() {
        println!("{}", "✓ Completed".green().bold());
    }
}
