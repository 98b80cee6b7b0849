use thiserror::Error;

/// Errors returned by the clustering engine
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClusterError {
    /// A run or step was requested before a distance metric was configured
    #[error("no distance metric configured; call set_metric before running")]
    MissingMetric,

    /// A run or step was requested without any points
    #[error("dataset is empty")]
    EmptyDataset,

    /// A cluster has no members, so its mean is undefined
    #[error("cluster {cluster} has no members and no point could be moved into it")]
    DegenerateCluster {
        /// Index of the empty cluster
        cluster: usize,
    },

    /// More seeds were requested than there are points
    #[error("cannot seed {requested} centroids from {available} points")]
    InsufficientData {
        /// Requested number of centroids
        requested: usize,
        /// Number of points in the dataset
        available: usize,
    },

    /// Two centroid sets of different length were compared
    #[error("centroid count changed between iterations: {previous} -> {next}")]
    MismatchedCentroidCount {
        /// Length of the earlier centroid set
        previous: usize,
        /// Length of the later centroid set
        next: usize,
    },

    /// Invalid parameter value
    #[error("invalid parameter {name}: {message}")]
    InvalidParameter {
        /// Parameter name
        name: &'static str,
        /// Human-readable explanation
        message: &'static str,
    },
}

/// Result type used by the clustering engine
pub type ClusterResult<T> = std::result::Result<T, ClusterError>;
