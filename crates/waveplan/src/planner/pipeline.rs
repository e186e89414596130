//! Full planning pipeline for one clustering algorithm variant.
//!
//! Distribute -> repair -> sanitize -> equalize -> validate. The final
//! validator run is the authoritative report; the repair phase is best-effort
//! and residual violations are surfaced, never raised.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::{ConfigError, PlannerConfig};
use crate::dataset::{Catalog, CommunityPartition, Environment};
use crate::planner::assignment::WaveAssignment;
use crate::planner::distribute::distribute;
use crate::planner::equalize::equalize;
use crate::planner::repair::repair;
use crate::planner::sanitize::sanitize;
use crate::planner::validate::{validate, ValidationIssue, WaveStat};

/// One row of the run summary, per algorithm variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanSummary {
    pub algorithm: String,
    pub num_waves_nonprod: usize,
    pub num_waves_prod: usize,
    pub issues_found: usize,
    pub repair_passes: usize,
}

/// Everything one planning run produces for one algorithm variant.
#[derive(Debug, Clone)]
pub struct PlanOutcome {
    pub algorithm: String,
    pub assignment: WaveAssignment,
    pub issues: Vec<ValidationIssue>,
    pub stats: Vec<WaveStat>,
    pub summary: PlanSummary,
}

/// Plan waves for one community partition.
///
/// The partition is consumed as an opaque, ordered mapping; the catalog
/// supplies application attributes and the dependency table. Fails only on an
/// unusable configuration.
pub fn plan(
    algorithm: &str,
    partition: &CommunityPartition,
    catalog: &Catalog,
    config: &PlannerConfig,
) -> Result<PlanOutcome, ConfigError> {
    config.validate()?;

    let mut assignment = WaveAssignment::empty(config.target_waves);
    for env in Environment::ALL {
        assignment.set_waves(env, distribute(partition, env, catalog, config.target_waves));
    }

    let repair_outcome = repair(&mut assignment, catalog, config);
    sanitize(&mut assignment, catalog, config.target_waves);
    equalize(&mut assignment, catalog, config.target_waves);

    let (issues, stats) = validate(&assignment, catalog, config, algorithm);
    info!(
        algorithm,
        passes = repair_outcome.passes,
        issues = issues.len(),
        "wave plan complete"
    );

    let summary = PlanSummary {
        algorithm: algorithm.to_string(),
        num_waves_nonprod: assignment.nonprod.len(),
        num_waves_prod: assignment.prod.len(),
        issues_found: issues.len(),
        repair_passes: repair_outcome.passes,
    };

    Ok(PlanOutcome {
        algorithm: algorithm.to_string(),
        assignment,
        issues,
        stats,
        summary,
    })
}
