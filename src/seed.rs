//! Farthest-point seeding
//!
//! The first centroid is one uniformly random dataset point. Each further
//! centroid is the remaining point whose summed distance to all centroids
//! chosen so far is largest, so after the single random draw the procedure is
//! deterministic. Ties go to the candidate that comes first in dataset order.
//!
//! Unlike k-means++ this never samples again, which keeps a seeded run
//! reproducible from one draw of the generator.

use crate::error::{ClusterError, ClusterResult};
use crate::metric::Metric;
use rand::Rng;

/// Dataset indices of `k` seeds, in selection order
pub fn seed_indices<T, R>(
    dataset: &[T],
    k: usize,
    metric: &dyn Metric<T>,
    rng: &mut R,
) -> ClusterResult<Vec<usize>>
where
    R: Rng + ?Sized,
{
    if k == 0 {
        return Err(ClusterError::InvalidParameter {
            name: "k",
            message: "must be at least 1",
        });
    }
    if k > dataset.len() {
        return Err(ClusterError::InsufficientData {
            requested: k,
            available: dataset.len(),
        });
    }

    let mut candidates: Vec<usize> = (0..dataset.len()).collect();
    let mut chosen = Vec::with_capacity(k);
    chosen.push(candidates.remove(rng.gen_range(0..candidates.len())));

    while chosen.len() < k {
        let mut best: Option<(usize, f64)> = None;
        for (slot, &candidate) in candidates.iter().enumerate() {
            let total: f64 = chosen
                .iter()
                .map(|&c| metric.distance(&dataset[candidate], &dataset[c]))
                .sum();
            if best.map_or(true, |(_, max)| total > max) {
                best = Some((slot, total));
            }
        }
        // candidates is non-empty while chosen.len() < k <= dataset.len()
        let Some((slot, _)) = best else { break };
        chosen.push(candidates.remove(slot));
    }

    Ok(chosen)
}

/// Pick `k` starting centroids from the dataset
pub fn seed<T, R>(
    dataset: &[T],
    k: usize,
    metric: &dyn Metric<T>,
    rng: &mut R,
) -> ClusterResult<Vec<T>>
where
    T: Clone,
    R: Rng + ?Sized,
{
    let indices = seed_indices(dataset, k, metric, rng)?;
    Ok(indices.into_iter().map(|i| dataset[i].clone()).collect())
}
