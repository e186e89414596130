//! Constraint repair engine.
//!
//! A bounded fixed-point loop over local, greedy repair rules. The constraint
//! set (ordering + locality + balance + placement) is not jointly satisfiable
//! for arbitrary input, so each rule makes forward progress on its own
//! violation class and the validator reports whatever remains after the
//! iteration cap.
//!
//! Rule order within a pass is load-bearing: later rules assume earlier ones
//! already ran this pass. The wave-index map is computed once per pass, so a
//! rule may act on an index that an earlier move invalidated; every relocation
//! therefore re-checks the live wave before removing, and a stale move
//! degrades to a no-op instead of a fault.

use std::collections::BTreeMap;

use tracing::debug;

use crate::config::PlannerConfig;
use crate::dataset::{Catalog, Environment};
use crate::planner::assignment::{earliest_rank, remove_first, WaveAssignment};

/// How many iterations each bounded loop actually used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepairOutcome {
    /// Full rule passes run by the main loop.
    pub passes: usize,
    /// Iterations of the secondary sequencing correction.
    pub sequencing_passes: usize,
}

type WaveIndex = BTreeMap<String, (Environment, usize)>;

/// Run the bounded repair loop, then the secondary sequencing correction.
///
/// Best-effort: the wave count per environment is held at
/// `config.target_waves`, everything else is reduced, not guaranteed.
pub fn repair(
    assignment: &mut WaveAssignment,
    catalog: &Catalog,
    config: &PlannerConfig,
) -> RepairOutcome {
    let mut passes = 0;
    let mut changed = true;
    while changed && passes < config.max_repair_passes {
        changed = false;
        passes += 1;
        let index = assignment.index_map();
        changed |= sequencing_rule(assignment, catalog, &index, config);
        changed |= dependency_rules(assignment, catalog, &index, config);
        changed |= placement_rule(assignment, catalog, config);
        structural_rule(assignment, config.target_waves);
        debug!(pass = passes, changed, "repair pass complete");
    }

    let sequencing_passes = sequencing_correction(assignment, catalog, config);
    debug!(passes, sequencing_passes, "repair finished");
    RepairOutcome {
        passes,
        sequencing_passes,
    }
}

/// Rule 1: for every base application in both environments, prod's earliest
/// wave must come strictly after nonprod's. Prefers pushing prod forward to
/// `nonprod + 1`; when nonprod already sits in the last wave, pulls nonprod
/// back one wave instead.
fn sequencing_rule(
    assignment: &mut WaveAssignment,
    catalog: &Catalog,
    index: &WaveIndex,
    config: &PlannerConfig,
) -> bool {
    let target_waves = config.target_waves;
    let mut changed = false;
    for instances in catalog.base_groups().values() {
        let (nonprod, prod) = split_by_env(instances);
        if nonprod.is_empty() || prod.is_empty() {
            continue;
        }
        let np_idx = earliest_rank(index, &nonprod);
        let p_idx = earliest_rank(index, &prod);
        if p_idx > np_idx {
            continue;
        }
        if np_idx < target_waves - 1 {
            let to = np_idx + 1;
            changed |= move_instances(assignment, Environment::Prod, &prod, index, to);
        } else {
            let to = np_idx.saturating_sub(1);
            changed |= move_instances(assignment, Environment::Nonprod, &nonprod, index, to);
        }
    }
    changed
}

/// Rules 2 and 3, applied per dependency edge in input row order.
///
/// Colocation: a source at or above the colocation threshold drags its
/// same-environment application targets into its own wave. This cascades
/// across passes by design. Locality: a critical source with a heavy edge
/// drags the target into its wave unless the target already sits in the same
/// or the immediately preceding wave.
fn dependency_rules(
    assignment: &mut WaveAssignment,
    catalog: &Catalog,
    index: &WaveIndex,
    config: &PlannerConfig,
) -> bool {
    let mut changed = false;
    for edge in catalog.app_dependencies() {
        let (Some(&(s_env, s_idx)), Some(&(t_env, t_idx))) =
            (index.get(&edge.source), index.get(&edge.target))
        else {
            continue;
        };
        if s_env != t_env {
            continue;
        }
        let Some(bcp_src) = catalog.bcp_score(&edge.source) else {
            continue;
        };

        if bcp_src >= config.colocation_bcp_threshold && s_idx != t_idx {
            changed |= relocate(assignment, t_env, &edge.target, t_idx, s_idx);
        }

        let co_resident = t_idx == s_idx || (s_idx > 0 && t_idx == s_idx - 1);
        if bcp_src >= config.critical_bcp_threshold
            && edge.weight > config.critical_weight_threshold
            && !co_resident
        {
            let preferred = s_idx.min(config.target_waves - 1);
            changed |= relocate(assignment, t_env, &edge.target, t_idx, preferred);
        }
    }
    changed
}

/// Rule 4: mission-critical applications are pulled out of the first and
/// last waves into the midpoint of the interquartile wave range. Skipped for
/// environments with two or fewer waves, where no interior exists.
fn placement_rule(
    assignment: &mut WaveAssignment,
    catalog: &Catalog,
    config: &PlannerConfig,
) -> bool {
    let mut changed = false;
    for env in Environment::ALL {
        let waves = assignment.waves_mut(env);
        let n = waves.len();
        if n <= 2 {
            continue;
        }
        let low = (0.25 * n as f64).floor() as usize;
        let high = (0.75 * n as f64).ceil() as usize - 1;
        let middle = (low + high) / 2;
        for i in 0..n {
            if i != 0 && i != n - 1 {
                continue;
            }
            let snapshot = waves[i].clone();
            for app in snapshot {
                let Some(score) = catalog.bcp_score(&app) else {
                    continue;
                };
                if score >= config.mission_critical_bcp_threshold
                    && remove_first(&mut waves[i], &app)
                {
                    waves[middle].push(app);
                    changed = true;
                }
            }
        }
    }
    changed
}

/// Rule 5: hold the wave count at exactly `target_waves`. Shortfalls are
/// padded with empty waves; overflow waves are merged into the last permitted
/// wave rather than discarded.
fn structural_rule(assignment: &mut WaveAssignment, target_waves: usize) {
    for env in Environment::ALL {
        let waves = assignment.waves_mut(env);
        while waves.len() < target_waves {
            waves.push(Vec::new());
        }
        while waves.len() > target_waves {
            let extra = waves.pop().unwrap_or_default();
            waves[target_waves - 1].extend(extra);
        }
    }
}

/// Secondary sequencing correction, run to its own bound after the main loop.
///
/// Same violation as rule 1 but the opposite preference: pull nonprod earlier
/// when it has room, otherwise push prod later. Rule 1 alone may not
/// stabilize when interleaved with colocation moves.
fn sequencing_correction(
    assignment: &mut WaveAssignment,
    catalog: &Catalog,
    config: &PlannerConfig,
) -> usize {
    let target_waves = config.target_waves;
    let mut iterations = 0;
    let mut changed = true;
    while changed && iterations < config.max_sequencing_passes {
        changed = false;
        iterations += 1;
        let index = assignment.index_map();
        for instances in catalog.base_groups().values() {
            let (nonprod, prod) = split_by_env(instances);
            if nonprod.is_empty() || prod.is_empty() {
                continue;
            }
            let np_idx = earliest_rank(&index, &nonprod);
            let p_idx = earliest_rank(&index, &prod);
            if p_idx > np_idx {
                continue;
            }
            if np_idx > 0 {
                let to = np_idx - 1;
                changed |= move_instances(assignment, Environment::Nonprod, &nonprod, &index, to);
            } else if p_idx < target_waves - 1 {
                let to = (p_idx + 1).min(target_waves - 1);
                changed |= move_instances(assignment, Environment::Prod, &prod, &index, to);
            }
        }
    }
    iterations
}

fn split_by_env(instances: &[String]) -> (Vec<String>, Vec<String>) {
    let nonprod = instances
        .iter()
        .filter(|i| Environment::Nonprod.owns_instance(i))
        .cloned()
        .collect();
    let prod = instances
        .iter()
        .filter(|i| Environment::Prod.owns_instance(i))
        .cloned()
        .collect();
    (nonprod, prod)
}

/// Move every mapped instance in `ids` into wave `to` of `env`, removing each
/// from the wave the index map last saw it in. Unmapped instances stay put.
fn move_instances(
    assignment: &mut WaveAssignment,
    env: Environment,
    ids: &[String],
    index: &WaveIndex,
    to: usize,
) -> bool {
    let mut changed = false;
    let waves = assignment.waves_mut(env);
    if to >= waves.len() {
        return false;
    }
    for id in ids {
        let Some(&(_, old_idx)) = index.get(id) else {
            continue;
        };
        if old_idx == to {
            continue;
        }
        if old_idx < waves.len() {
            remove_first(&mut waves[old_idx], id);
        }
        waves[to].push(id.clone());
        changed = true;
    }
    changed
}

/// Remove `id` from wave `from` (when still there) and append it to wave `to`
/// unless already present. Returns whether the append happened.
fn relocate(
    assignment: &mut WaveAssignment,
    env: Environment,
    id: &str,
    from: usize,
    to: usize,
) -> bool {
    let waves = assignment.waves_mut(env);
    if from < waves.len() {
        remove_first(&mut waves[from], id);
    }
    if to < waves.len() && !waves[to].iter().any(|m| m == id) {
        waves[to].push(id.to_string());
        return true;
    }
    false
}
