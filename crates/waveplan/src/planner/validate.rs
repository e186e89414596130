//! Constraint validator.
//!
//! Pure inspection over a wave assignment: emits typed issues and per-wave
//! stats, never mutates. Dependency edges whose endpoints are not in the
//! assignment are skipped; they are assumed out of scope (server or database
//! targets, or instances filtered upstream).

use serde::{Deserialize, Serialize};

use crate::config::PlannerConfig;
use crate::dataset::{Catalog, Environment};
use crate::planner::assignment::{earliest_rank, WaveAssignment};

/// The distinct constraint violations the validator reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    WaveCountMismatch,
    WaveSizeOutOfBounds,
    EnvExclusivityViolation,
    NonprodNotBeforeProd,
    NonprodProductionGapTooSmall,
    CrossEnvDependency,
    CrossWaveHighBcp,
    CriticalNotCoMigrate,
    MissionCriticalEdgeWave,
}

/// One detected violation. Only the fields relevant to the kind are set; the
/// record flattens to one row in the issue report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationIssue {
    #[serde(rename = "type")]
    pub kind: IssueKind,
    pub algorithm: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub env: Option<Environment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wave_index: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_app: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_apps: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_range: Option<[usize; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nonprod_wave: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prod_wave: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gap: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_wave: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_wave: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
}

impl ValidationIssue {
    fn new(kind: IssueKind, algorithm: &str) -> Self {
        Self {
            kind,
            algorithm: algorithm.to_string(),
            env: None,
            wave_index: None,
            app: None,
            base_app: None,
            source: None,
            target: None,
            expected: None,
            actual: None,
            num_apps: None,
            preferred_range: None,
            nonprod_wave: None,
            prod_wave: None,
            gap: None,
            source_wave: None,
            target_wave: None,
            weight: None,
        }
    }
}

/// Population count for one (environment, wave) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaveStat {
    pub algorithm: String,
    pub env: Environment,
    pub wave_index: usize,
    pub num_apps: usize,
}

/// Run every constraint check against `assignment`.
///
/// Idempotent: two calls on the same assignment yield identical issue and
/// stats lists.
#[must_use]
pub fn validate(
    assignment: &WaveAssignment,
    catalog: &Catalog,
    config: &PlannerConfig,
    algorithm: &str,
) -> (Vec<ValidationIssue>, Vec<WaveStat>) {
    let mut issues = Vec::new();
    let mut stats = Vec::new();
    let index = assignment.index_map();

    // Wave counts per environment.
    for env in Environment::ALL {
        let actual = assignment.waves(env).len();
        if actual != config.target_waves {
            let mut issue = ValidationIssue::new(IssueKind::WaveCountMismatch, algorithm);
            issue.env = Some(env);
            issue.expected = Some(config.target_waves);
            issue.actual = Some(actual);
            issues.push(issue);
        }
    }

    // Per-wave stats and preferred-size checks. The size bounds are
    // informational: breaches are reported, never repaired.
    for env in Environment::ALL {
        for (i, wave) in assignment.waves(env).iter().enumerate() {
            stats.push(WaveStat {
                algorithm: algorithm.to_string(),
                env,
                wave_index: i,
                num_apps: wave.len(),
            });
            if wave.len() < config.min_wave_size || wave.len() > config.max_wave_size {
                let mut issue = ValidationIssue::new(IssueKind::WaveSizeOutOfBounds, algorithm);
                issue.env = Some(env);
                issue.wave_index = Some(i);
                issue.num_apps = Some(wave.len());
                issue.preferred_range = Some([config.min_wave_size, config.max_wave_size]);
                issues.push(issue);
            }
        }
    }

    // Environment exclusivity by id suffix.
    for env in Environment::ALL {
        for (i, wave) in assignment.waves(env).iter().enumerate() {
            for app in wave {
                if !env.owns_instance(app) {
                    let mut issue =
                        ValidationIssue::new(IssueKind::EnvExclusivityViolation, algorithm);
                    issue.env = Some(env);
                    issue.wave_index = Some(i);
                    issue.app = Some(app.clone());
                    issues.push(issue);
                }
            }
        }
    }

    // Nonprod precedes prod for every base application present in both.
    for (base, instances) in catalog.base_groups() {
        let nonprod: Vec<String> = instances
            .iter()
            .filter(|i| Environment::Nonprod.owns_instance(i))
            .cloned()
            .collect();
        let prod: Vec<String> = instances
            .iter()
            .filter(|i| Environment::Prod.owns_instance(i))
            .cloned()
            .collect();
        if nonprod.is_empty() || prod.is_empty() {
            continue;
        }
        let np_idx = earliest_rank(&index, &nonprod);
        let p_idx = earliest_rank(&index, &prod);
        if p_idx <= np_idx {
            let mut issue = ValidationIssue::new(IssueKind::NonprodNotBeforeProd, algorithm);
            issue.base_app = Some(base.clone());
            issue.nonprod_wave = Some(np_idx);
            issue.prod_wave = Some(p_idx);
            issues.push(issue);
        }
        let gap = p_idx as i64 - np_idx as i64;
        if gap < 1 {
            let mut issue =
                ValidationIssue::new(IssueKind::NonprodProductionGapTooSmall, algorithm);
            issue.base_app = Some(base.clone());
            issue.gap = Some(gap);
            issues.push(issue);
        }
    }

    // Dependency constraints over application-sourced edges.
    for edge in catalog.app_dependencies() {
        let (Some(&(s_env, s_idx)), Some(&(t_env, t_idx))) =
            (index.get(&edge.source), index.get(&edge.target))
        else {
            continue;
        };
        let Some(bcp_src) = catalog.bcp_score(&edge.source) else {
            continue;
        };
        if s_env != t_env {
            // Cross-environment dependencies are disallowed outright; the
            // remaining checks assume same-environment endpoints.
            let mut issue = ValidationIssue::new(IssueKind::CrossEnvDependency, algorithm);
            issue.source = Some(edge.source.clone());
            issue.target = Some(edge.target.clone());
            issues.push(issue);
            continue;
        }
        if bcp_src >= config.colocation_bcp_threshold && s_idx != t_idx {
            let mut issue = ValidationIssue::new(IssueKind::CrossWaveHighBcp, algorithm);
            issue.source = Some(edge.source.clone());
            issue.target = Some(edge.target.clone());
            issue.source_wave = Some(s_idx);
            issue.target_wave = Some(t_idx);
            issues.push(issue);
        }
        let co_resident = t_idx == s_idx || (s_idx > 0 && t_idx == s_idx - 1);
        if bcp_src >= config.critical_bcp_threshold
            && edge.weight > config.critical_weight_threshold
            && !co_resident
        {
            let mut issue = ValidationIssue::new(IssueKind::CriticalNotCoMigrate, algorithm);
            issue.source = Some(edge.source.clone());
            issue.target = Some(edge.target.clone());
            issue.weight = Some(edge.weight);
            issue.source_wave = Some(s_idx);
            issue.target_wave = Some(t_idx);
            issues.push(issue);
        }
    }

    // Mission-critical applications must not sit in the first or last wave.
    for env in Environment::ALL {
        let n = assignment.waves(env).len();
        for (i, wave) in assignment.waves(env).iter().enumerate() {
            for app in wave {
                let Some(score) = catalog.bcp_score(app) else {
                    continue;
                };
                if score >= config.mission_critical_bcp_threshold && (i == 0 || i == n - 1) {
                    let mut issue =
                        ValidationIssue::new(IssueKind::MissionCriticalEdgeWave, algorithm);
                    issue.env = Some(env);
                    issue.wave_index = Some(i);
                    issue.app = Some(app.clone());
                    issues.push(issue);
                }
            }
        }
    }

    (issues, stats)
}
