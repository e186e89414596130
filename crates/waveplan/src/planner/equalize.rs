//! Equalizer: final risk-balanced rebuild.
//!
//! Rebuilds each environment's wave sequence from scratch: the authoritative
//! application set comes from the catalog (by id suffix, independent of
//! anything earlier phases produced), ordered by descending BCP score with
//! ties kept in table row order, then sliced with the same largest-remainder
//! sizing the distributor uses. This supersedes the community-contiguity
//! structure built earlier; see DESIGN.md for why that is preserved as-is.

use crate::dataset::{Catalog, Environment};
use crate::planner::assignment::WaveAssignment;
use crate::planner::distribute::slice_into_waves;

pub fn equalize(assignment: &mut WaveAssignment, catalog: &Catalog, target_waves: usize) {
    for env in Environment::ALL {
        let mut ordered: Vec<String> = catalog
            .env_instances(env)
            .into_iter()
            .map(str::to_string)
            .collect();
        // Stable sort: equal scores keep their table order.
        ordered.sort_by(|a, b| {
            let sa = catalog.bcp_score(a).unwrap_or(0.0);
            let sb = catalog.bcp_score(b).unwrap_or(0.0);
            sb.total_cmp(&sa)
        });
        assignment.set_waves(env, slice_into_waves(ordered, target_waves));
    }
}
