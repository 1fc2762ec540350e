//! `license-compat`: check license compatibility across a dependency tree.
//!
//! # Flow
//! 1. Parse CLI arguments ([`cli`]).
//! 2. Load the scan config ([`license_compat::load_config`]) and apply CLI overrides.
//! 3. Read the dependency tree JSON produced by an external lockfile parser.
//! 4. Run one scan ([`license_compat::detect_conflicts`]).
//! 5. Render the requested report ([`report`]).
//! 6. Exit `0`, or `1` when a conflict reaches the `fail_on` severity.

mod cli;
mod report;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, ReportFormat};
use license_compat::models::{DependencyNode, ScanResult, Severity};
use license_compat::{detect_conflicts, load_config};

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.quiet);

    // Load scan config
    let project_dir = cli.project_dir();
    let mut config = load_config(&project_dir, cli.config.as_deref())
        .context("failed to load scan config")?;
    cli.apply_overrides(&mut config);

    // Read the materialized dependency tree
    let raw = std::fs::read_to_string(&cli.tree)
        .with_context(|| format!("failed to read dependency tree {}", cli.tree.display()))?;
    let tree: DependencyNode = serde_json::from_str(&raw)
        .with_context(|| format!("invalid dependency tree {}", cli.tree.display()))?;

    let result = detect_conflicts(&tree, &config)?;

    // Render report
    match cli.report {
        ReportFormat::Terminal => {
            report::terminal::render(&result, &tree, cli.verbose, cli.quiet)?;
        }
        ReportFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
    }

    // Exit code: 1 if any conflict reaches the threshold
    if reaches_threshold(&result, config.fail_on) {
        std::process::exit(1);
    }

    Ok(())
}

/// Logs go to stderr so `--report json` output stays parseable.
fn init_tracing(verbose: bool, quiet: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else if quiet {
        EnvFilter::new("error")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn reaches_threshold(result: &ScanResult, fail_on: Severity) -> bool {
    result
        .conflicts
        .iter()
        .any(|c| c.conflict.severity >= fail_on)
}
