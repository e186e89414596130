#![forbid(unsafe_code)]

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use clap::Parser;

use waveplan::cli::{Cli, Command, PlanArgs, ValidateArgs};
use waveplan::config::PlannerConfig;
use waveplan::dataset::{load_apps, load_dependencies, load_partition, Catalog};
use waveplan::planner::assignment::WaveAssignment;
use waveplan::planner::pipeline::plan;
use waveplan::planner::validate::validate;
use waveplan::report::{wave_rows, write_plan_outputs, write_summary, write_wave_rows};

fn main() -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .try_init();

    let cli = Cli::parse();
    match cli.command {
        Command::Plan(args) => run_plan(args),
        Command::Validate(args) => run_validate(args),
    }
}

fn load_catalog(apps: &std::path::Path, deps: &std::path::Path) -> Result<Catalog> {
    let apps = load_apps(apps).context("loading application table")?;
    let deps = load_dependencies(deps).context("loading dependency table")?;
    Ok(Catalog::new(apps, deps))
}

fn run_plan(args: PlanArgs) -> Result<()> {
    let config = PlannerConfig::discover(args.config.as_deref())?;
    let catalog = load_catalog(&args.apps, &args.deps)?;

    let mut summaries = Vec::new();
    let mut all_rows = Vec::new();
    for (algorithm, path) in &args.communities {
        let partition = load_partition(path)
            .with_context(|| format!("loading community partition for {algorithm}"))?;
        let outcome = plan(algorithm, &partition, &catalog, &config)?;
        write_plan_outputs(&args.out_dir, &outcome)
            .with_context(|| format!("writing outputs for {algorithm}"))?;
        all_rows.extend(wave_rows(&outcome));
        summaries.push(outcome.summary);
    }
    write_wave_rows(&args.out_dir, &all_rows).context("writing combined wave table")?;
    write_summary(&args.out_dir, &summaries).context("writing run summary")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
    } else {
        for s in &summaries {
            println!(
                "{}: {} nonprod waves, {} prod waves, {} issue(s), {} repair pass(es)",
                s.algorithm, s.num_waves_nonprod, s.num_waves_prod, s.issues_found, s.repair_passes
            );
        }
    }
    Ok(())
}

fn run_validate(args: ValidateArgs) -> Result<()> {
    let config = PlannerConfig::discover(args.config.as_deref())?;
    let catalog = load_catalog(&args.apps, &args.deps)?;

    let content = std::fs::read_to_string(&args.waves)
        .with_context(|| format!("reading wave assignment {}", args.waves.display()))?;
    let assignment: WaveAssignment = serde_json::from_str(&content)
        .with_context(|| format!("parsing wave assignment {}", args.waves.display()))?;

    let (issues, stats) = validate(&assignment, &catalog, &config, &args.algorithm);

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "issues": issues,
                "stats": stats,
            }))?
        );
    } else {
        let mut by_kind: BTreeMap<String, usize> = BTreeMap::new();
        for issue in &issues {
            let key = serde_json::to_value(issue.kind)?
                .as_str()
                .unwrap_or("unknown")
                .to_string();
            *by_kind.entry(key).or_default() += 1;
        }
        println!("{} issue(s) across {} wave(s)", issues.len(), stats.len());
        for (kind, count) in &by_kind {
            println!("  {kind}: {count}");
        }
    }
    Ok(())
}
