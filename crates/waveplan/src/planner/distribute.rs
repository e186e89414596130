//! Wave distributor: community partition -> initial wave sequence.

use crate::dataset::{Catalog, CommunityPartition, Environment};

/// Slice sizes for distributing `total` items across `n` waves with the
/// largest-remainder method: the first `total % n` waves get one extra item.
#[must_use]
pub fn largest_remainder_sizes(total: usize, n: usize) -> Vec<usize> {
    let base = total / n;
    let rem = total % n;
    (0..n).map(|i| if i < rem { base + 1 } else { base }).collect()
}

/// Partition `ordered` into `n` contiguous slices sized by
/// [`largest_remainder_sizes`].
#[must_use]
pub fn slice_into_waves(ordered: Vec<String>, n: usize) -> Vec<Vec<String>> {
    let total = ordered.len();
    if total == 0 {
        return vec![Vec::new(); n];
    }
    let sizes = largest_remainder_sizes(total, n);
    let mut waves = Vec::with_capacity(n);
    let mut idx = 0;
    for size in sizes {
        waves.push(ordered[idx..idx + size].to_vec());
        idx += size;
    }
    // Largest-remainder sizes always sum to the total; nothing is left over.
    debug_assert_eq!(idx, total);
    waves
}

/// Build the initial wave sequence for one environment.
///
/// Communities are flattened in partition iteration order, so members of the
/// same community land in adjacent slots; only members present in the catalog
/// and carrying the environment's suffix are kept. Deterministic: placement
/// follows input order alone.
#[must_use]
pub fn distribute(
    partition: &CommunityPartition,
    env: Environment,
    catalog: &Catalog,
    target_waves: usize,
) -> Vec<Vec<String>> {
    let ordered: Vec<String> = partition
        .values()
        .flat_map(|members| {
            members
                .iter()
                .filter(|m| catalog.contains(m) && env.owns_instance(m))
                .cloned()
        })
        .collect();
    slice_into_waves(ordered, target_waves)
}
