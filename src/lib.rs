//! clusterstep: K-means clustering with automatic cluster-count selection
//!
//! The engine grows K from 1, runs Lloyd's algorithm to convergence for each K
//! with farthest-point seeding, and stops at the elbow of the inertia curve.
//! It is generic over the point type and the distance metric, and can be
//! driven one step at a time so callers can animate intermediate states.
//!
//! ```rust
//! use clusterstep::{ClusterEngine, EngineConfig, Point2, SquaredEuclidean};
//!
//! let mut engine = ClusterEngine::<Point2>::new(EngineConfig::default().with_seed(7))
//!     .unwrap()
//!     .with_metric(SquaredEuclidean);
//! engine.set_dataset(vec![
//!     Point2::new(0.0, 0.0),
//!     Point2::new(0.0, 1.0),
//!     Point2::new(1.0, 0.0),
//!     Point2::new(1.0, 1.0),
//!     Point2::new(10.0, 10.0),
//!     Point2::new(10.0, 11.0),
//!     Point2::new(11.0, 10.0),
//!     Point2::new(11.0, 11.0),
//! ]);
//!
//! let model = engine.run_to_completion().unwrap();
//! assert_eq!(model.k, 2);
//! ```

pub mod cli;
pub mod convergence;
pub mod data;
pub mod engine;
pub mod error;
pub mod metric;
pub mod model;
pub mod partition;
pub mod point;
pub mod seed;
pub mod selector;
pub mod viz;

// Re-export public items for easier access
pub use cli::{Args, MetricKind};
pub use data::{load_and_process_data, PointData, StandardScaler};
pub use engine::{ClusterEngine, EngineConfig, Phase};
pub use error::{ClusterError, ClusterResult};
pub use metric::{Euclidean, Metric, SquaredEuclidean};
pub use model::{Classification, ClusterModel};
pub use point::{Point, Point2};
pub use selector::{ElbowThreshold, ErrorHistory, StopReason};
pub use viz::{create_cluster_visualization, FrameWriter};

/// Result type used by the I/O, rendering and CLI layers
pub type Result<T> = anyhow::Result<T>;
