//! Convergence test for successive centroid sets of one K

use crate::error::{ClusterError, ClusterResult};
use crate::metric::Metric;

/// Default largest centroid movement still counted as converged
pub const DEFAULT_EPSILON: f64 = 1e-5;

/// Largest distance any centroid moved between `previous` and `next`
pub fn max_movement<T>(previous: &[T], next: &[T], metric: &dyn Metric<T>) -> ClusterResult<f64> {
    if previous.len() != next.len() {
        return Err(ClusterError::MismatchedCentroidCount {
            previous: previous.len(),
            next: next.len(),
        });
    }

    Ok(previous
        .iter()
        .zip(next.iter())
        .map(|(a, b)| metric.distance(a, b))
        .fold(0.0, f64::max))
}

/// Whether no centroid moved farther than `epsilon`
pub fn has_converged<T>(
    previous: &[T],
    next: &[T],
    epsilon: f64,
    metric: &dyn Metric<T>,
) -> ClusterResult<bool> {
    Ok(max_movement(previous, next, metric)? <= epsilon)
}
