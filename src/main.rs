//! clusterstep: cluster 2-D points with K-means, choosing K by the elbow heuristic
//!
//! This is the main entrypoint that orchestrates data loading, normalization,
//! clustering (blocking or stepped with animation frames), prediction and
//! reporting.

use anyhow::{Context, Result};
use clap::Parser;
use clusterstep::viz::{self, print_cluster_statistics};
use clusterstep::{
    load_and_process_data, Args, ClusterEngine, ClusterModel, Euclidean, FrameWriter, Metric,
    MetricKind, Phase, Point2, PointData, SquaredEuclidean,
};
use std::path::Path;
use std::time::Instant;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse();
    init_tracing(args.verbose);

    match args.metric {
        MetricKind::SquaredEuclidean => dispatch(&args, SquaredEuclidean),
        MetricKind::Euclidean => dispatch(&args, Euclidean),
    }
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn dispatch<M>(args: &Args, metric: M) -> Result<()>
where
    M: Metric<Point2> + Copy + Send + 'static,
{
    if args.verbose {
        println!("clusterstep - K-means with elbow selection");
        println!("==========================================\n");
    }

    // Check if in prediction mode
    if let Some(point) = args.parse_predict_point()? {
        run_prediction_mode(args, metric, point)
    } else {
        run_full_pipeline(args, metric)
    }
}

/// Load the input and build an engine over it
fn prepare<M>(args: &Args, metric: M) -> Result<(PointData, ClusterEngine<Point2>)>
where
    M: Metric<Point2> + Send + 'static,
{
    if args.verbose {
        println!("Loading points from: {}", args.input.display());
    }
    let data = load_and_process_data(&args.input, !args.raw)?;

    let mut engine = ClusterEngine::new(args.engine_config())?.with_metric(metric);
    engine.set_dataset(data.points.clone());
    Ok((data, engine))
}

/// Classify a single new point against the selected clustering
fn run_prediction_mode<M>(args: &Args, metric: M, point: Point2) -> Result<()>
where
    M: Metric<Point2> + Copy + Send + 'static,
{
    println!("=== Prediction Mode ===");
    println!("Input point: x={}, y={}", point.x, point.y);

    let start_time = Instant::now();
    let (data, mut engine) = prepare(args, metric)?;
    let model = engine.run_to_completion()?;

    let scaled = data.scale_new_point(point);
    let cluster = model.predict(&scaled, &metric);
    let elapsed = start_time.elapsed();

    println!("\n✓ Predicted Cluster: {} (of {})", cluster, model.k);
    println!("  Processing time: {:.2}s", elapsed.as_secs_f64());

    let sizes = model.cluster_sizes();
    let percentage = (sizes[cluster] as f64 / data.points.len() as f64) * 100.0;
    let centroid = data.unscale_point(model.centroids[cluster]);
    println!("\nCluster {} details:", cluster);
    println!("  Size: {} points ({:.1}% of total)", sizes[cluster], percentage);
    println!("  Centroid: x={:.3}, y={:.3}", centroid.x, centroid.y);

    Ok(())
}

/// Run full clustering pipeline
fn run_full_pipeline<M>(args: &Args, metric: M) -> Result<()>
where
    M: Metric<Point2> + Copy + Send + 'static,
{
    println!("=== Full Clustering Pipeline ===\n");
    let start_time = Instant::now();

    let (data, mut engine) = prepare(args, metric)?;
    println!("✓ Data loaded: {} points", data.points.len());
    if args.verbose {
        let normalization = if data.scaler.is_some() { "z-score" } else { "none" };
        println!("  Normalization: {}", normalization);
        println!("  Epsilon: {}", args.epsilon);
        println!("  Max iterations per K: {}", args.max_iters);
    }

    let cluster_start = Instant::now();
    let model = match &args.frames {
        Some(dir) => run_animated(&mut engine, &data, dir, args.frames_per_step)?,
        None => engine.run_to_completion()?,
    };
    println!("✓ Clustering finished: K = {}", model.k);
    if args.verbose {
        println!(
            "  Clustering time: {:.2}s",
            cluster_start.elapsed().as_secs_f64()
        );
    }

    print_cluster_statistics(&data, &model, &metric);
    viz::create_cluster_visualization(&data, &model, &args.output)?;

    println!("\n=== Pipeline Complete ===");
    println!(
        "Total processing time: {:.2}s",
        start_time.elapsed().as_secs_f64()
    );
    Ok(())
}

/// Step the engine to the end, writing animation frames after every step
fn run_animated(
    engine: &mut ClusterEngine<Point2>,
    data: &PointData,
    dir: &Path,
    frames_per_step: usize,
) -> Result<ClusterModel<Point2>> {
    let mut writer = FrameWriter::new(dir, &data.points, frames_per_step)?;
    let mut steps = 0usize;

    while !engine.is_finished() {
        let classification = engine.step()?.clone();
        steps += 1;
        writer.write_step(
            &data.points,
            &classification,
            engine.previous_centroids(),
            engine.centroids(),
        )?;
        if let Phase::Converged { k, error } = engine.phase() {
            info!(k, error, "cluster count evaluated");
        }
    }

    println!(
        "✓ {} frames for {} steps written to {}",
        writer.frames_written(),
        steps,
        dir.display()
    );
    engine
        .model()
        .cloned()
        .context("engine finished without a model")
}
