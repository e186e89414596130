//! Flat output records and report writers.
//!
//! One JSON file per table, matching the upstream reporting layout:
//! `waves_<algo>.json` (env-keyed nested wave lists), flat issue and stats
//! tables, and a combined run summary.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::dataset::Environment;
use crate::planner::pipeline::{PlanOutcome, PlanSummary};

/// One (algorithm, env, wave, application) row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaveRow {
    pub algorithm: String,
    pub env: Environment,
    pub wave_index: usize,
    pub app_instance_id: String,
}

/// Flatten an outcome's assignment into one row per placed application.
#[must_use]
pub fn wave_rows(outcome: &PlanOutcome) -> Vec<WaveRow> {
    let mut rows = Vec::new();
    for env in Environment::ALL {
        for (i, wave) in outcome.assignment.waves(env).iter().enumerate() {
            for app in wave {
                rows.push(WaveRow {
                    algorithm: outcome.algorithm.clone(),
                    env,
                    wave_index: i,
                    app_instance_id: app.clone(),
                });
            }
        }
    }
    rows
}

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("failed to create output directory {0}: {1}")]
    CreateDirFailed(PathBuf, std::io::Error),

    #[error("failed to write {0}: {1}")]
    WriteFailed(PathBuf, std::io::Error),

    #[error("failed to serialize report: {0}")]
    SerializeFailed(#[from] serde_json::Error),
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), ReportError> {
    let body = serde_json::to_string_pretty(value)?;
    std::fs::write(path, body).map_err(|e| ReportError::WriteFailed(path.into(), e))
}

/// Write the per-algorithm outputs: the wave assignment plus the issue and
/// stats tables.
pub fn write_plan_outputs(out_dir: &Path, outcome: &PlanOutcome) -> Result<(), ReportError> {
    std::fs::create_dir_all(out_dir)
        .map_err(|e| ReportError::CreateDirFailed(out_dir.into(), e))?;
    let algo = &outcome.algorithm;
    write_json(
        &out_dir.join(format!("waves_{algo}.json")),
        &outcome.assignment,
    )?;
    write_json(
        &out_dir.join(format!("validation_issues_{algo}.json")),
        &outcome.issues,
    )?;
    write_json(
        &out_dir.join(format!("validation_stats_{algo}.json")),
        &outcome.stats,
    )?;
    Ok(())
}

/// Write the combined flat wave table across algorithm variants.
pub fn write_wave_rows(out_dir: &Path, rows: &[WaveRow]) -> Result<(), ReportError> {
    std::fs::create_dir_all(out_dir)
        .map_err(|e| ReportError::CreateDirFailed(out_dir.into(), e))?;
    write_json(&out_dir.join("waves.json"), &rows)
}

/// Write the combined run summary across algorithm variants.
pub fn write_summary(out_dir: &Path, summaries: &[PlanSummary]) -> Result<(), ReportError> {
    std::fs::create_dir_all(out_dir)
        .map_err(|e| ReportError::CreateDirFailed(out_dir.into(), e))?;
    write_json(&out_dir.join("wave_plan_summary.json"), &summaries)
}
