//! One Lloyd iteration: assign points to centroids, then recompute centroids
//!
//! # Empty clusters
//!
//! With duplicate points two seeds can coincide, and the nearest-centroid rule
//! then leaves the later cluster without members. Its mean is undefined, so
//! [`repair_empty_clusters`] hands every empty cluster the point that lies
//! farthest from its own centroid, taken from a cluster that keeps at least one
//! member. K never shrinks and [`recompute`] always sees populated clusters.

use crate::error::{ClusterError, ClusterResult};
use crate::metric::Metric;
use crate::model::Classification;
use crate::point::{mean_of, Point};
use tracing::debug;

/// Index of and distance to the centroid nearest to `point`
///
/// Strict less-than: the lowest centroid index wins ties
pub fn nearest<T>(point: &T, centroids: &[T], metric: &dyn Metric<T>) -> (usize, f64) {
    let mut min_distance = f64::INFINITY;
    let mut closest = 0;

    for (index, centroid) in centroids.iter().enumerate() {
        let distance = metric.distance(centroid, point);
        if distance < min_distance {
            min_distance = distance;
            closest = index;
        }
    }

    (closest, min_distance)
}

/// Assign every point to its nearest centroid
pub fn classify<T>(dataset: &[T], centroids: &[T], metric: &dyn Metric<T>) -> Classification {
    let mut classification = Classification::with_clusters(centroids.len());
    for (index, point) in dataset.iter().enumerate() {
        let (cluster, _) = nearest(point, centroids, metric);
        classification.assign(index, cluster);
    }
    classification
}

/// Give every empty cluster one member. Returns how many clusters were repaired
///
/// Empty clusters are filled in ascending order. The donor is the point with
/// the largest distance to its current centroid among clusters holding more
/// than one point; the first such point wins ties.
pub fn repair_empty_clusters<T>(
    dataset: &[T],
    centroids: &[T],
    classification: &mut Classification,
    metric: &dyn Metric<T>,
) -> ClusterResult<usize> {
    let mut repaired = 0;

    for empty in 0..classification.k() {
        if !classification.members(empty).is_empty() {
            continue;
        }

        let mut donor: Option<(usize, usize, f64)> = None;
        for (cluster, members) in classification.iter() {
            if members.len() < 2 {
                continue;
            }
            for &point in members {
                let distance = metric.distance(&centroids[cluster], &dataset[point]);
                if donor.map_or(true, |(_, _, best)| distance > best) {
                    donor = Some((cluster, point, distance));
                }
            }
        }

        let (from, point, distance) =
            donor.ok_or(ClusterError::DegenerateCluster { cluster: empty })?;
        debug!(cluster = empty, from, point, distance, "refilling empty cluster");
        classification.move_point(point, from, empty);
        repaired += 1;
    }

    Ok(repaired)
}

/// Mean of each cluster's members, in ascending cluster order
pub fn recompute<T: Point>(dataset: &[T], classification: &Classification) -> ClusterResult<Vec<T>> {
    classification
        .iter()
        .map(|(cluster, members)| {
            mean_of(dataset, members).ok_or(ClusterError::DegenerateCluster { cluster })
        })
        .collect()
}

/// Total member-to-centroid distance over all clusters (inertia)
pub fn inertia<T>(
    dataset: &[T],
    classification: &Classification,
    centroids: &[T],
    metric: &dyn Metric<T>,
) -> f64 {
    classification
        .iter()
        .map(|(cluster, members)| {
            members
                .iter()
                .map(|&point| metric.distance(&centroids[cluster], &dataset[point]))
                .sum::<f64>()
        })
        .sum()
}
