//! Sanitizer: restore the exactly-once assignment invariant.
//!
//! Repair moves can leave duplicates, wrong-environment members, or drop an
//! application entirely. This pass rebuilds every wave's membership: an
//! application is kept at its first claim (nonprod waves first, then prod,
//! waves in order) when its suffix matches the wave's environment; everything
//! never claimed is redistributed round-robin across its environment's waves.

use std::collections::BTreeSet;

use crate::dataset::{Catalog, Environment};
use crate::planner::assignment::WaveAssignment;

pub fn sanitize(assignment: &mut WaveAssignment, catalog: &Catalog, target_waves: usize) {
    let mut seen: BTreeSet<String> = BTreeSet::new();

    for env in Environment::ALL {
        let waves = assignment.waves_mut(env);
        while waves.len() < target_waves {
            waves.push(Vec::new());
        }
        for wave in waves.iter_mut() {
            let mut kept = Vec::with_capacity(wave.len());
            for app in wave.drain(..) {
                if !env.owns_instance(&app) {
                    continue;
                }
                if seen.contains(&app) {
                    continue;
                }
                seen.insert(app.clone());
                kept.push(app);
            }
            *wave = kept;
        }
    }

    // Redistribute anything the repair phase lost.
    for env in Environment::ALL {
        let missing: Vec<String> = catalog
            .env_instances(env)
            .into_iter()
            .filter(|id| !seen.contains(*id))
            .map(str::to_string)
            .collect();
        let waves = assignment.waves_mut(env);
        if waves.is_empty() {
            *waves = vec![Vec::new(); target_waves];
        }
        let n = waves.len();
        for (j, app) in missing.into_iter().enumerate() {
            seen.insert(app.clone());
            waves[j % n].push(app);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::AppInstance;

    fn app(id: &str) -> AppInstance {
        let env = Environment::of_instance(id).expect("suffixed id");
        AppInstance {
            app_instance_id: id.to_string(),
            base_app_id: id.rsplit_once('-').map(|(b, _)| b.to_string()).unwrap(),
            env,
            app_type: String::new(),
            rto_hours: 0.0,
            rpo_minutes: 0.0,
            financial_impact_k_per_hour: 0.0,
            regulatory: false,
            customer_impact: 0.0,
            bcp_score: 5.0,
            bcp_tier: None,
        }
    }

    #[test]
    fn duplicates_keep_the_first_claim() {
        let catalog = Catalog::new(vec![app("A-prod")], Vec::new());
        let mut assignment = WaveAssignment::empty(3);
        assignment.prod[0].push("A-prod".to_string());
        assignment.prod[2].push("A-prod".to_string());
        sanitize(&mut assignment, &catalog, 3);
        assert_eq!(assignment.prod[0], vec!["A-prod"]);
        assert!(assignment.prod[2].is_empty());
    }

    #[test]
    fn wrong_environment_members_are_dropped_then_redistributed() {
        let catalog = Catalog::new(vec![app("A-nonprod")], Vec::new());
        let mut assignment = WaveAssignment::empty(2);
        assignment.prod[0].push("A-nonprod".to_string());
        sanitize(&mut assignment, &catalog, 2);
        assert!(assignment.prod[0].is_empty());
        // The instance was never validly claimed, so it lands back in its own
        // environment round-robin, starting at wave 0.
        assert_eq!(assignment.nonprod[0], vec!["A-nonprod"]);
    }

    #[test]
    fn lost_applications_come_back_round_robin() {
        let catalog = Catalog::new(
            vec![app("A-prod"), app("B-prod"), app("C-prod")],
            Vec::new(),
        );
        let mut assignment = WaveAssignment::empty(2);
        sanitize(&mut assignment, &catalog, 2);
        assert_eq!(assignment.prod[0], vec!["A-prod", "C-prod"]);
        assert_eq!(assignment.prod[1], vec!["B-prod"]);
    }

    #[test]
    fn short_wave_lists_are_padded() {
        let catalog = Catalog::new(Vec::new(), Vec::new());
        let mut assignment = WaveAssignment {
            nonprod: Vec::new(),
            prod: vec![Vec::new()],
        };
        sanitize(&mut assignment, &catalog, 4);
        assert_eq!(assignment.nonprod.len(), 4);
        assert_eq!(assignment.prod.len(), 4);
    }

    #[test]
    fn exactly_once_holds_after_sanitize() {
        let catalog = Catalog::new(
            vec![app("A-prod"), app("B-prod"), app("A-nonprod")],
            Vec::new(),
        );
        let mut assignment = WaveAssignment::empty(3);
        assignment.prod[0].push("A-prod".to_string());
        assignment.prod[1].push("A-prod".to_string());
        assignment.prod[1].push("A-nonprod".to_string());
        sanitize(&mut assignment, &catalog, 3);

        let mut all: Vec<String> = assignment.prod.iter().flatten().cloned().collect();
        all.sort();
        assert_eq!(all, vec!["A-prod".to_string(), "B-prod".to_string()]);
        let nonprod: Vec<String> = assignment.nonprod.iter().flatten().cloned().collect();
        assert_eq!(nonprod, vec!["A-nonprod".to_string()]);
    }
}
