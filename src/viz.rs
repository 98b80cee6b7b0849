//! Rendering of clustering states with Plotters
//!
//! Every frame shows the points as rings colored by cluster and the centroids
//! as larger rings on a black background. [`FrameWriter`] turns the centroid
//! pair exposed after each engine step into numbered PNG frames, linearly
//! interpolating centroid positions so the frames play back as an animation.

use crate::data::PointData;
use crate::metric::Metric;
use crate::model::{Classification, ClusterModel};
use crate::point::Point2;
use anyhow::Context;
use plotters::prelude::*;
use plotters::style::HSLColor;
use std::path::{Path, PathBuf};

/// Frame size in pixels
pub const DEFAULT_FRAME_SIZE: (u32, u32) = (800, 800);

/// Frames used to animate the centroid movement of one step
pub const DEFAULT_FRAMES_PER_STEP: usize = 60;

const POINT_RADIUS: i32 = 3;
const CENTROID_RADIUS: i32 = 6;

/// One color per cluster, evenly spaced around the hue wheel
pub fn cluster_colors(n_clusters: usize) -> Vec<HSLColor> {
    (0..n_clusters)
        .map(|i| HSLColor(i as f64 / n_clusters as f64, 0.5, 0.78))
        .collect()
}

/// Position at time `t` in `[0, 1]` on the segment from `start` to `finish`
pub fn interpolate(start: Point2, finish: Point2, t: f64) -> Point2 {
    start.lerp(finish, t)
}

/// Interpolate every centroid; falls back to `current` when K changed
pub fn interpolate_centroids(previous: &[Point2], current: &[Point2], t: f64) -> Vec<Point2> {
    if previous.len() != current.len() {
        return current.to_vec();
    }
    previous
        .iter()
        .zip(current)
        .map(|(&start, &finish)| interpolate(start, finish, t))
        .collect()
}

/// Data-space rectangle mapped onto the frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewBounds {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl ViewBounds {
    /// Bounding box of `points` with a 5% margin; never degenerate
    pub fn from_points(points: &[Point2]) -> Self {
        let x_min = points.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
        let x_max = points.iter().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max);
        let y_min = points.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
        let y_max = points.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max);

        if !(x_min.is_finite() && x_max.is_finite() && y_min.is_finite() && y_max.is_finite()) {
            return Self {
                x_min: -1.0,
                x_max: 1.0,
                y_min: -1.0,
                y_max: 1.0,
            };
        }

        let x_pad = ((x_max - x_min) * 0.05).max(0.5);
        let y_pad = ((y_max - y_min) * 0.05).max(0.5);
        Self {
            x_min: x_min - x_pad,
            x_max: x_max + x_pad,
            y_min: y_min - y_pad,
            y_max: y_max + y_pad,
        }
    }
}

/// Draw one clustering state to a PNG file
///
/// # Arguments
/// * `output_path` - Where to write the PNG
/// * `points` - Points in the same space as the centroids
/// * `classification` - Cluster membership of `points`
/// * `centroids` - Centroid positions to draw, indexed by cluster
/// * `bounds` - Data-space view rectangle
/// * `size` - Frame size in pixels
pub fn render_frame(
    output_path: &Path,
    points: &[Point2],
    classification: &Classification,
    centroids: &[Point2],
    bounds: ViewBounds,
    size: (u32, u32),
) -> crate::Result<()> {
    let colors = cluster_colors(classification.k().max(centroids.len()));

    let root = BitMapBackend::new(output_path, size).into_drawing_area();
    root.fill(&BLACK)?;

    let mut chart = ChartBuilder::on(&root)
        .margin(10)
        .build_cartesian_2d(bounds.x_min..bounds.x_max, bounds.y_min..bounds.y_max)?;

    for (cluster, members) in classification.iter() {
        let color = &colors[cluster];
        chart.draw_series(members.iter().filter_map(|&i| points.get(i)).map(|p| {
            Circle::new((p.x, p.y), POINT_RADIUS, color.stroke_width(1))
        }))?;
    }

    chart.draw_series(centroids.iter().enumerate().map(|(cluster, c)| {
        Circle::new((c.x, c.y), CENTROID_RADIUS, colors[cluster].stroke_width(2))
    }))?;

    root.present()
        .with_context(|| format!("failed to write frame {}", output_path.display()))?;
    Ok(())
}

/// Writes numbered animation frames for successive engine steps
#[derive(Debug, Clone)]
pub struct FrameWriter {
    dir: PathBuf,
    frames_per_step: usize,
    size: (u32, u32),
    bounds: ViewBounds,
    next_frame: usize,
}

impl FrameWriter {
    /// Create the output directory; bounds are fitted to `points`
    pub fn new(
        dir: impl Into<PathBuf>,
        points: &[Point2],
        frames_per_step: usize,
    ) -> crate::Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create frame directory {}", dir.display()))?;
        Ok(Self {
            dir,
            frames_per_step: frames_per_step.max(1),
            size: DEFAULT_FRAME_SIZE,
            bounds: ViewBounds::from_points(points),
            next_frame: 0,
        })
    }

    pub fn with_size(mut self, size: (u32, u32)) -> Self {
        self.size = size;
        self
    }

    /// Path of frame number `index`; zero-padded so names sort in play order
    pub fn frame_path(&self, index: usize) -> PathBuf {
        self.dir.join(format!("frame_{index:05}.png"))
    }

    pub fn frames_written(&self) -> usize {
        self.next_frame
    }

    /// Write the frames for one step and return how many were written
    ///
    /// Moving centroids with an unchanged count are animated over
    /// `frames_per_step` frames; anything else yields a single frame.
    pub fn write_step(
        &mut self,
        points: &[Point2],
        classification: &Classification,
        previous: &[Point2],
        current: &[Point2],
    ) -> crate::Result<usize> {
        let animate = previous.len() == current.len() && previous != current;
        let frames = if animate { self.frames_per_step } else { 1 };

        for frame in 1..=frames {
            let t = frame as f64 / frames as f64;
            let centroids = interpolate_centroids(previous, current, t);
            let path = self.frame_path(self.next_frame);
            render_frame(&path, points, classification, &centroids, self.bounds, self.size)?;
            self.next_frame += 1;
        }
        Ok(frames)
    }
}

/// Render the final clustering to a single PNG
pub fn create_cluster_visualization(
    data: &PointData,
    model: &ClusterModel<Point2>,
    output_path: &Path,
) -> crate::Result<()> {
    let bounds = ViewBounds::from_points(&data.points);
    render_frame(
        output_path,
        &data.points,
        &model.classification,
        &model.centroids,
        bounds,
        DEFAULT_FRAME_SIZE,
    )?;
    println!("Cluster visualization saved to: {}", output_path.display());
    Ok(())
}

/// Print cluster statistics to console
pub fn print_cluster_statistics(
    data: &PointData,
    model: &ClusterModel<Point2>,
    metric: &dyn Metric<Point2>,
) {
    let total = data.points.len();
    println!("\n=== Cluster Statistics ===");
    println!("Selected number of clusters: {}", model.k);
    println!("Total points: {}", total);
    println!("Within-cluster error (inertia): {:.4}", model.error);

    let silhouette_score = model.compute_silhouette_sample(&data.points, metric, 500);
    println!("Silhouette score (sample): {:.3}", silhouette_score);

    println!("\nCluster sizes:");
    for (i, &size) in model.cluster_sizes().iter().enumerate() {
        let percentage = (size as f64 / total as f64) * 100.0;
        println!("  Cluster {}: {} points ({:.1}%)", i, size, percentage);
    }

    println!("\nCluster centroids (original units):");
    println!("  Cluster |        x |        y");
    println!("  --------|----------|----------");
    for (i, &centroid) in model.centroids.iter().enumerate() {
        let raw = data.unscale_point(centroid);
        println!("  {:7} | {:8.3} | {:8.3}", i, raw.x, raw.y);
    }
}
