//! Clustering results: the point-to-cluster classification and the fitted model

use crate::metric::Metric;
use crate::partition;

/// Mapping from cluster index to the indices of its member points
///
/// Every point of the dataset appears in exactly one cluster. Member lists are
/// kept in ascending point order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Classification {
    clusters: Vec<Vec<usize>>,
}

impl Classification {
    /// An empty classification with `k` clusters
    pub fn with_clusters(k: usize) -> Self {
        Self {
            clusters: vec![Vec::new(); k],
        }
    }

    /// Build a classification from one cluster label per point
    pub fn from_labels(labels: &[usize], k: usize) -> Self {
        let mut classification = Self::with_clusters(k);
        for (point, &label) in labels.iter().enumerate() {
            classification.assign(point, label);
        }
        classification
    }

    /// Append `point` to `cluster`. Points must be assigned in ascending order
    pub(crate) fn assign(&mut self, point: usize, cluster: usize) {
        self.clusters[cluster].push(point);
    }

    /// Move `point` from cluster `from` into cluster `to`, keeping both sorted
    pub(crate) fn move_point(&mut self, point: usize, from: usize, to: usize) {
        if let Ok(pos) = self.clusters[from].binary_search(&point) {
            self.clusters[from].remove(pos);
        }
        let target = &mut self.clusters[to];
        if let Err(pos) = target.binary_search(&point) {
            target.insert(pos, point);
        }
    }

    /// Number of clusters, including empty ones
    pub fn k(&self) -> usize {
        self.clusters.len()
    }

    /// Total number of classified points
    pub fn n_points(&self) -> usize {
        self.clusters.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.n_points() == 0
    }

    /// Member point indices of `cluster`
    pub fn members(&self, cluster: usize) -> &[usize] {
        &self.clusters[cluster]
    }

    /// Iterate `(cluster index, members)` in ascending cluster order
    pub fn iter(&self) -> impl Iterator<Item = (usize, &[usize])> + '_ {
        self.clusters
            .iter()
            .enumerate()
            .map(|(cluster, members)| (cluster, members.as_slice()))
    }

    /// Number of points per cluster
    pub fn sizes(&self) -> Vec<usize> {
        self.clusters.iter().map(Vec::len).collect()
    }

    /// Cluster label of each point, indexed by point
    pub fn labels(&self) -> Vec<usize> {
        let mut labels = vec![0; self.n_points()];
        for (cluster, members) in self.iter() {
            for &point in members {
                if point < labels.len() {
                    labels[point] = cluster;
                }
            }
        }
        labels
    }

    /// Whether the clusters are disjoint and together cover exactly `0..n`
    pub fn is_partition_of(&self, n: usize) -> bool {
        let mut seen = vec![false; n];
        for (_, members) in self.iter() {
            for &point in members {
                if point >= n || seen[point] {
                    return false;
                }
                seen[point] = true;
            }
        }
        seen.into_iter().all(|s| s)
    }
}

/// Final output of a clustering run
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterModel<T> {
    /// Selected number of clusters
    pub k: usize,
    /// Cluster centroids, indexed by cluster
    pub centroids: Vec<T>,
    /// Point-to-cluster assignment for the training data
    pub classification: Classification,
    /// Total within-cluster distance (inertia) under the run's metric
    pub error: f64,
}

impl<T> ClusterModel<T> {
    /// Predict the cluster of a new point (nearest centroid, first wins ties)
    pub fn predict(&self, point: &T, metric: &dyn Metric<T>) -> usize {
        partition::nearest(point, &self.centroids, metric).0
    }

    /// Get cluster sizes
    pub fn cluster_sizes(&self) -> Vec<usize> {
        self.classification.sizes()
    }

    /// Mean silhouette coefficient over the first `sample_size` points
    ///
    /// Distances come from `metric`. Returns 0.0 when fewer than two points
    /// are sampled or only one cluster exists.
    pub fn compute_silhouette_sample(
        &self,
        dataset: &[T],
        metric: &dyn Metric<T>,
        sample_size: usize,
    ) -> f64 {
        let n_samples = dataset.len().min(sample_size);
        if n_samples < 2 || self.k < 2 {
            return 0.0;
        }

        let labels = self.classification.labels();
        let mut silhouette_sum = 0.0;

        for i in 0..n_samples {
            let cluster_label = labels[i];

            let mut same_sum = 0.0;
            let mut same_count = 0usize;
            let mut other_sums = vec![0.0; self.k];
            let mut other_counts = vec![0usize; self.k];

            for j in 0..n_samples {
                if i == j {
                    continue;
                }
                let distance = metric.distance(&dataset[i], &dataset[j]);
                let other_label = labels[j];
                if other_label == cluster_label {
                    same_sum += distance;
                    same_count += 1;
                } else {
                    other_sums[other_label] += distance;
                    other_counts[other_label] += 1;
                }
            }

            // a(i): mean distance within own cluster
            let a_i = if same_count == 0 {
                0.0
            } else {
                same_sum / same_count as f64
            };

            // b(i): lowest mean distance to another cluster
            let b_i = other_sums
                .iter()
                .zip(other_counts.iter())
                .filter(|(_, count)| **count > 0)
                .map(|(&sum, &count)| sum / count as f64)
                .fold(f64::INFINITY, f64::min);

            let silhouette_i = if b_i.is_infinite() || (a_i == 0.0 && b_i == 0.0) {
                0.0
            } else {
                (b_i - a_i) / a_i.max(b_i)
            };

            silhouette_sum += silhouette_i;
        }

        silhouette_sum / n_samples as f64
    }
}
