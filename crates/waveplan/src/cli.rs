//! waveplan: phased migration wave planner.
//!
//! Plans fixed-size migration waves per environment from an externally
//! produced community partition, repairs them against business-continuity
//! and sequencing constraints, and reports residual violations.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "waveplan", version, about, long_about = None, propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Plan waves for one or more community partitions.
    Plan(PlanArgs),

    /// Re-run the constraint validator over a previously written assignment.
    Validate(ValidateArgs),
}

#[derive(Debug, Parser)]
pub struct PlanArgs {
    /// Application table (JSON array of instance rows).
    #[arg(long)]
    pub apps: PathBuf,

    /// Dependency table (JSON array of edge rows).
    #[arg(long)]
    pub deps: PathBuf,

    /// Community partition per algorithm variant, as `name=path`.
    /// Repeatable; each variant is planned independently.
    #[arg(long = "communities", value_parser = parse_named_path, required = true)]
    pub communities: Vec<(String, PathBuf)>,

    /// Directory for the generated reports.
    #[arg(long, default_value = "outputs")]
    pub out_dir: PathBuf,

    /// Config file override (default discovery is used when omitted).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Print the run summary as JSON instead of human-readable lines.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Parser)]
pub struct ValidateArgs {
    /// Application table (JSON array of instance rows).
    #[arg(long)]
    pub apps: PathBuf,

    /// Dependency table (JSON array of edge rows).
    #[arg(long)]
    pub deps: PathBuf,

    /// Wave assignment to inspect (env-keyed nested wave lists).
    #[arg(long)]
    pub waves: PathBuf,

    /// Algorithm label recorded on emitted issues.
    #[arg(long, default_value = "plan")]
    pub algorithm: String,

    /// Config file override.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Print issues and stats as JSON instead of a human summary.
    #[arg(long)]
    pub json: bool,
}

fn parse_named_path(raw: &str) -> Result<(String, PathBuf), String> {
    match raw.split_once('=') {
        Some((name, path)) if !name.is_empty() && !path.is_empty() => {
            Ok((name.to_string(), PathBuf::from(path)))
        }
        _ => Err(format!("expected `name=path`, got `{raw}`")),
    }
}
