//! Mutable wave-assignment state.
//!
//! One ordered wave list per environment. The repair engine mutates this in
//! place; relocation is always an explicit remove-from/append-to pair so there
//! is no aliasing between waves.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::dataset::Environment;

/// Sentinel rank for instances absent from the index map. Unassigned
/// instances sort after every real wave when reducing to earliest indices.
pub const UNASSIGNED_RANK: usize = 999;

/// Per-environment ordered wave lists.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WaveAssignment {
    pub nonprod: Vec<Vec<String>>,
    pub prod: Vec<Vec<String>>,
}

impl WaveAssignment {
    /// An assignment with `target_waves` empty waves per environment.
    #[must_use]
    pub fn empty(target_waves: usize) -> Self {
        Self {
            nonprod: vec![Vec::new(); target_waves],
            prod: vec![Vec::new(); target_waves],
        }
    }

    #[must_use]
    pub fn waves(&self, env: Environment) -> &Vec<Vec<String>> {
        match env {
            Environment::Nonprod => &self.nonprod,
            Environment::Prod => &self.prod,
        }
    }

    pub fn waves_mut(&mut self, env: Environment) -> &mut Vec<Vec<String>> {
        match env {
            Environment::Nonprod => &mut self.nonprod,
            Environment::Prod => &mut self.prod,
        }
    }

    pub fn set_waves(&mut self, env: Environment, waves: Vec<Vec<String>>) {
        *self.waves_mut(env) = waves;
    }

    /// Map each assigned instance id to its (environment, wave index).
    ///
    /// Iterates nonprod then prod, waves in order, members in order; when an
    /// id appears more than once the later occurrence wins, matching the
    /// iteration the repair rules were written against.
    #[must_use]
    pub fn index_map(&self) -> BTreeMap<String, (Environment, usize)> {
        let mut map = BTreeMap::new();
        for env in Environment::ALL {
            for (i, wave) in self.waves(env).iter().enumerate() {
                for id in wave {
                    map.insert(id.clone(), (env, i));
                }
            }
        }
        map
    }
}

/// Remove the first occurrence of `id` from `wave`. Returns whether anything
/// was removed; a miss is a no-op, not a fault.
pub fn remove_first(wave: &mut Vec<String>, id: &str) -> bool {
    if let Some(pos) = wave.iter().position(|member| member == id) {
        wave.remove(pos);
        true
    } else {
        false
    }
}

/// Earliest wave rank across `ids` according to `index`, with unassigned
/// instances ranking as [`UNASSIGNED_RANK`].
#[must_use]
pub fn earliest_rank(
    index: &BTreeMap<String, (Environment, usize)>,
    ids: &[String],
) -> usize {
    ids.iter()
        .map(|id| index.get(id).map_or(UNASSIGNED_RANK, |&(_, i)| i))
        .min()
        .unwrap_or(UNASSIGNED_RANK)
}
