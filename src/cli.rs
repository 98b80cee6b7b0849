//! Command-line interface definitions and argument parsing

use crate::engine::{EngineConfig, DEFAULT_MAX_ITERATIONS};
use crate::point::Point2;
use crate::selector::{ElbowThreshold, DEFAULT_ELBOW_THRESHOLD};
use crate::viz::DEFAULT_FRAMES_PER_STEP;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Distance functions selectable from the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MetricKind {
    /// Squared Euclidean distance
    SquaredEuclidean,
    /// Euclidean distance
    Euclidean,
}

/// Cluster 2-D points with K-means, choosing K by the elbow heuristic
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the input file, one `x,y` pair per line
    #[arg(short, long, default_value = "data.csv")]
    pub input: PathBuf,

    /// Output path for the final cluster plot
    #[arg(short, long, default_value = "cluster_plot.png")]
    pub output: PathBuf,

    /// Write one PNG per animation frame into this directory, stepping the engine
    #[arg(long)]
    pub frames: Option<PathBuf>,

    /// Frames used to animate one step's centroid movement
    #[arg(long, default_value_t = DEFAULT_FRAMES_PER_STEP)]
    pub frames_per_step: usize,

    /// Distance function
    #[arg(long, value_enum, default_value_t = MetricKind::SquaredEuclidean)]
    pub metric: MetricKind,

    /// Largest centroid movement still counted as converged
    #[arg(long, default_value = "1e-5")]
    pub epsilon: f64,

    /// Maximum Lloyd iterations per cluster count
    #[arg(long, default_value_t = DEFAULT_MAX_ITERATIONS)]
    pub max_iters: usize,

    /// Bound on the second difference of the error curve
    #[arg(long, default_value_t = DEFAULT_ELBOW_THRESHOLD)]
    pub elbow_threshold: f64,

    /// Treat the elbow threshold as a fraction of the oldest error in the window
    #[arg(long)]
    pub relative_elbow: bool,

    /// Seed for reproducible runs
    #[arg(long)]
    pub seed: Option<u64>,

    /// Cluster the points as read, without z-score normalization
    #[arg(long)]
    pub raw: bool,

    /// Prediction mode: provide x,y values as comma-separated string
    /// Example: --predict "3.5,-1.0"
    #[arg(short, long, allow_hyphen_values = true)]
    pub predict: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Engine configuration described by the arguments
    pub fn engine_config(&self) -> EngineConfig {
        let elbow = if self.relative_elbow {
            ElbowThreshold::Relative(self.elbow_threshold)
        } else {
            ElbowThreshold::Absolute(self.elbow_threshold)
        };
        let config = EngineConfig::default()
            .with_epsilon(self.epsilon)
            .with_max_iterations(self.max_iters)
            .with_elbow(elbow);
        match self.seed {
            Some(seed) => config.with_seed(seed),
            None => config,
        }
    }

    /// Parse the point from the predict string
    /// Expected format: "x,y"
    pub fn parse_predict_point(&self) -> crate::Result<Option<Point2>> {
        let Some(ref predict_str) = self.predict else {
            return Ok(None);
        };

        let parts: Vec<&str> = predict_str.split(',').collect();
        if parts.len() != 2 {
            anyhow::bail!("Predict values must be in format 'x,y'");
        }

        let x: f64 = parts[0]
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("Invalid x value: {}", parts[0]))?;
        let y: f64 = parts[1]
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("Invalid y value: {}", parts[1]))?;

        Ok(Some(Point2::new(x, y)))
    }
}
