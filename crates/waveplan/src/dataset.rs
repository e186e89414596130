//! Input data model and the read-only planning catalog.
//!
//! Application instances, dependency edges, and community partitions are
//! produced upstream (inventory tooling and the clustering step) and consumed
//! here as immutable input. Field names follow the upstream wire format
//! (`app_instance_id`, `BCP_score`, `near-real-time`, ...).

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Migration environment. Every entity belongs to exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    Nonprod,
    Prod,
}

impl Environment {
    /// Both environments, in planning order.
    pub const ALL: [Environment; 2] = [Environment::Nonprod, Environment::Prod];

    /// The instance-id suffix for this environment (`-nonprod` / `-prod`).
    #[must_use]
    pub fn suffix(self) -> &'static str {
        match self {
            Environment::Nonprod => "-nonprod",
            Environment::Prod => "-prod",
        }
    }

    /// Classify an instance id by its environment suffix.
    #[must_use]
    pub fn of_instance(instance_id: &str) -> Option<Environment> {
        if instance_id.ends_with(Environment::Nonprod.suffix()) {
            Some(Environment::Nonprod)
        } else if instance_id.ends_with(Environment::Prod.suffix()) {
            Some(Environment::Prod)
        } else {
            None
        }
    }

    /// Whether an instance id carries this environment's suffix.
    #[must_use]
    pub fn owns_instance(self, instance_id: &str) -> bool {
        instance_id.ends_with(self.suffix())
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Nonprod => write!(f, "nonprod"),
            Environment::Prod => write!(f, "prod"),
        }
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "nonprod" => Ok(Environment::Nonprod),
            "prod" => Ok(Environment::Prod),
            other => Err(format!("unknown environment: {other}")),
        }
    }
}

/// Business-continuity tier derived from the BCP score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BcpTier {
    #[serde(rename = "Mission Critical")]
    MissionCritical,
    #[serde(rename = "Business Critical")]
    BusinessCritical,
    #[serde(rename = "Business Operational")]
    BusinessOperational,
    #[serde(rename = "Non-Critical")]
    NonCritical,
}

impl BcpTier {
    /// Derive the tier from a 1-10 BCP score, rounding to the nearest whole
    /// point before bucketing.
    #[must_use]
    pub fn from_score(score: f64) -> BcpTier {
        let s = score.round() as i64;
        if s >= 9 {
            BcpTier::MissionCritical
        } else if s >= 7 {
            BcpTier::BusinessCritical
        } else if s >= 5 {
            BcpTier::BusinessOperational
        } else {
            BcpTier::NonCritical
        }
    }
}

/// One application instance (a base application deployed to one environment).
///
/// Immutable input; the planner only reads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppInstance {
    pub app_instance_id: String,
    pub base_app_id: String,
    pub env: Environment,

    #[serde(default)]
    pub app_type: String,

    #[serde(rename = "RTO_hours", default)]
    pub rto_hours: f64,

    #[serde(rename = "RPO_minutes", default)]
    pub rpo_minutes: f64,

    #[serde(default)]
    pub financial_impact_k_per_hour: f64,

    #[serde(default)]
    pub regulatory: bool,

    #[serde(default)]
    pub customer_impact: f64,

    #[serde(rename = "BCP_score")]
    pub bcp_score: f64,

    #[serde(rename = "BCP_tier", default)]
    pub bcp_tier: Option<BcpTier>,
}

impl AppInstance {
    /// The instance's tier, falling back to the score-derived bucket when the
    /// input row carries none.
    #[must_use]
    pub fn tier(&self) -> BcpTier {
        self.bcp_tier.unwrap_or_else(|| BcpTier::from_score(self.bcp_score))
    }
}

/// Kind of node a dependency endpoint refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Application,
    Server,
    Database,
}

/// How tightly coupled a dependency is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DependencyKind {
    Synchronous,
    NearRealTime,
    Asynchronous,
    Batch,
    Informational,
    Fallback,
}

/// One dependency edge. Immutable input.
///
/// `weight` is a composite score derived upstream from the source's BCP
/// score, the dependency kind, and the data-flow score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependencyEdge {
    pub source: String,
    pub target: String,

    #[serde(rename = "source_type")]
    pub source_kind: NodeKind,

    #[serde(rename = "target_type")]
    pub target_kind: NodeKind,

    #[serde(rename = "dependency_type")]
    pub dependency_kind: DependencyKind,

    #[serde(default)]
    pub data_flow_score: f64,

    pub weight: f64,
}

/// Community partition produced by an external clustering algorithm:
/// community id -> ordered member instance ids.
///
/// Insertion order is load-bearing: the distributor flattens communities in
/// iteration order.
pub type CommunityPartition = IndexMap<String, Vec<String>>;

/// Read-only index over the application and dependency tables.
pub struct Catalog {
    apps: Vec<AppInstance>,
    by_id: BTreeMap<String, usize>,
    /// base_app_id -> instance ids, members in table row order.
    base_groups: BTreeMap<String, Vec<String>>,
    /// Dependency rows whose source is an application, in table row order.
    app_deps: Vec<DependencyEdge>,
}

impl Catalog {
    #[must_use]
    pub fn new(apps: Vec<AppInstance>, deps: Vec<DependencyEdge>) -> Self {
        let mut by_id = BTreeMap::new();
        let mut base_groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (row, app) in apps.iter().enumerate() {
            by_id.insert(app.app_instance_id.clone(), row);
            base_groups
                .entry(app.base_app_id.clone())
                .or_default()
                .push(app.app_instance_id.clone());
        }
        let app_deps = deps
            .into_iter()
            .filter(|d| d.source_kind == NodeKind::Application)
            .collect();
        Self {
            apps,
            by_id,
            base_groups,
            app_deps,
        }
    }

    /// All application instances in table row order.
    #[must_use]
    pub fn apps(&self) -> &[AppInstance] {
        &self.apps
    }

    #[must_use]
    pub fn get(&self, instance_id: &str) -> Option<&AppInstance> {
        self.by_id.get(instance_id).map(|&row| &self.apps[row])
    }

    #[must_use]
    pub fn contains(&self, instance_id: &str) -> bool {
        self.by_id.contains_key(instance_id)
    }

    #[must_use]
    pub fn bcp_score(&self, instance_id: &str) -> Option<f64> {
        self.get(instance_id).map(|a| a.bcp_score)
    }

    /// base_app_id -> instance ids, keys in sorted order.
    #[must_use]
    pub fn base_groups(&self) -> &BTreeMap<String, Vec<String>> {
        &self.base_groups
    }

    /// Dependency rows with an application source, in input row order.
    #[must_use]
    pub fn app_dependencies(&self) -> &[DependencyEdge] {
        &self.app_deps
    }

    /// Instance ids carrying the environment's suffix, in table row order.
    #[must_use]
    pub fn env_instances(&self, env: Environment) -> Vec<&str> {
        self.apps
            .iter()
            .map(|a| a.app_instance_id.as_str())
            .filter(|id| env.owns_instance(id))
            .collect()
    }
}

// -- Loading --

#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("failed to read {0}: {1}")]
    ReadFailed(PathBuf, std::io::Error),

    #[error("failed to parse {0}: {1}")]
    ParseFailed(PathBuf, serde_json::Error),
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, DatasetError> {
    let content =
        std::fs::read_to_string(path).map_err(|e| DatasetError::ReadFailed(path.into(), e))?;
    serde_json::from_str(&content).map_err(|e| DatasetError::ParseFailed(path.into(), e))
}

/// Load the application table from a JSON array of rows.
pub fn load_apps(path: &Path) -> Result<Vec<AppInstance>, DatasetError> {
    read_json(path)
}

/// Load the dependency table from a JSON array of rows.
pub fn load_dependencies(path: &Path) -> Result<Vec<DependencyEdge>, DatasetError> {
    read_json(path)
}

/// Load a community partition, preserving the file's key order.
pub fn load_partition(path: &Path) -> Result<CommunityPartition, DatasetError> {
    read_json(path)
}
