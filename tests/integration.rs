//! Integration tests for clusterstep

use clusterstep::{
    load_and_process_data, ClusterEngine, ClusterError, EngineConfig, FrameWriter, Phase, Point2,
    SquaredEuclidean, StopReason,
};
use clusterstep::partition::inertia;
use ndarray::{array, Array1, Array2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::io::Write;
use tempfile::{tempdir, NamedTempFile};

/// Two unit squares far apart
fn two_squares() -> Vec<Point2> {
    vec![
        Point2::new(0.0, 0.0),
        Point2::new(0.0, 1.0),
        Point2::new(1.0, 0.0),
        Point2::new(1.0, 1.0),
        Point2::new(10.0, 10.0),
        Point2::new(10.0, 11.0),
        Point2::new(11.0, 10.0),
        Point2::new(11.0, 11.0),
    ]
}

/// Five points within 0.01 of (5, 5)
fn tight_blob() -> Vec<Point2> {
    vec![
        Point2::new(5.0, 5.0),
        Point2::new(5.005, 5.0),
        Point2::new(4.995, 5.0),
        Point2::new(5.0, 5.005),
        Point2::new(5.0, 4.995),
    ]
}

fn seeded_engine(seed: u64) -> ClusterEngine<Point2> {
    ClusterEngine::new(EngineConfig::default().with_seed(seed))
        .unwrap()
        .with_metric(SquaredEuclidean)
}

fn close(a: Point2, b: Point2, tolerance: f64) -> bool {
    (a.x - b.x).abs() <= tolerance && (a.y - b.y).abs() <= tolerance
}

/// True when both labelings group the points identically
fn same_partition(a: &[usize], b: &[usize]) -> bool {
    a.len() == b.len()
        && (0..a.len()).all(|i| (0..a.len()).all(|j| (a[i] == a[j]) == (b[i] == b[j])))
}

/// 60 points in three overlapping groups, reproducible from `seed`
fn noisy_groups(seed: u64) -> Vec<Point2> {
    let mut rng = StdRng::seed_from_u64(seed);
    let centers = [(0.0, 0.0), (6.0, 1.0), (2.0, 7.0)];
    (0..60)
        .map(|i| {
            let (cx, cy) = centers[i % centers.len()];
            Point2::new(cx + rng.gen_range(-2.5..2.5), cy + rng.gen_range(-2.5..2.5))
        })
        .collect()
}

/// Create a test CSV file with two separated groups and some noise lines
fn create_test_csv() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "x,y").unwrap();
    for point in two_squares() {
        writeln!(file, "{},{}", point.x, point.y).unwrap();
    }
    writeln!(file, "not a point").unwrap();
    writeln!(file, "1,2,3").unwrap();
    file
}

#[test]
fn test_two_squares_select_two_clusters() {
    for seed in [0, 1, 7, 42, 1234] {
        let mut engine = seeded_engine(seed);
        engine.set_dataset(two_squares());
        let model = engine.run_to_completion().unwrap();

        assert_eq!(model.k, 2, "seed {seed}");
        let (a, b) = (model.centroids[0], model.centroids[1]);
        let low = Point2::new(0.5, 0.5);
        let high = Point2::new(10.5, 10.5);
        assert!(
            (close(a, low, 0.1) && close(b, high, 0.1))
                || (close(a, high, 0.1) && close(b, low, 0.1)),
            "seed {seed}: centroids {a:?} {b:?}"
        );
        assert!((model.error - 4.0).abs() < 1e-9);
        assert!(same_partition(
            &model.classification.labels(),
            &[0, 0, 0, 0, 1, 1, 1, 1]
        ));
        assert_eq!(engine.phase(), Phase::Finished { reason: StopReason::Elbow });
    }
}

#[test]
fn test_tight_blob_selects_one_cluster() {
    let mut engine = seeded_engine(3);
    engine.set_dataset(tight_blob());
    let model = engine.run_to_completion().unwrap();

    assert_eq!(model.k, 1);
    assert!(close(model.centroids[0], Point2::new(5.0, 5.0), 0.01));
    assert!(model.error < 1e-3);
    assert_eq!(model.classification.members(0), &[0, 1, 2, 3, 4]);
}

#[test]
fn test_stepping_matches_blocking_run() {
    let mut stepped = seeded_engine(99);
    stepped.set_dataset(two_squares());
    let mut steps = 0;
    while !stepped.is_finished() {
        stepped.step().unwrap();
        steps += 1;
        assert!(steps < 10_000, "stepper did not terminate");
    }

    let mut blocking = seeded_engine(99);
    blocking.set_dataset(two_squares());
    let model = blocking.run_to_completion().unwrap();

    let stepped_model = stepped.model().unwrap();
    assert_eq!(stepped.k(), model.k);
    assert_eq!(stepped_model.centroids, model.centroids);
    assert_eq!(
        stepped.classification().labels(),
        model.classification.labels()
    );
    assert_eq!(stepped.current_error(), Some(model.error));
}

#[test]
fn test_run_to_completion_restarts_search() {
    let mut engine = seeded_engine(5);
    engine.set_dataset(two_squares());
    engine.step().unwrap();
    engine.step().unwrap();

    let first = engine.run_to_completion().unwrap();
    let second = engine.run_to_completion().unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_converged_phases_report_errors() {
    let mut engine = seeded_engine(11);
    engine.set_dataset(two_squares());

    let mut errors = Vec::new();
    while !engine.is_finished() {
        engine.step().unwrap();
        assert!(engine.classification().is_partition_of(8));
        if let Phase::Converged { k, error } = engine.phase() {
            assert_eq!(engine.current_error(), Some(error));
            errors.push((k, error));
        }
    }

    assert_eq!(errors[0].0, 1);
    assert!((errors[0].1 - 404.0).abs() < 1e-9);
    assert!(errors.windows(2).all(|w| w[1].0 == w[0].0 + 1));
}

#[test]
fn test_stop_request_keeps_latest_converged_k() {
    let mut engine = seeded_engine(21);
    engine.set_dataset(two_squares());
    while !matches!(engine.phase(), Phase::Converged { k: 2, .. }) {
        engine.step().unwrap();
    }

    engine.step().unwrap();
    engine.request_stop();
    engine.step().unwrap();

    assert_eq!(
        engine.phase(),
        Phase::Finished {
            reason: StopReason::Cancelled
        }
    );
    let model = engine.model().unwrap();
    assert_eq!(model.k, 2);
    assert_eq!(engine.k(), 2);
}

#[test]
fn test_configuration_errors() {
    let mut engine = ClusterEngine::<Point2>::new(EngineConfig::default()).unwrap();
    engine.set_dataset(two_squares());
    assert_eq!(engine.step().unwrap_err(), ClusterError::MissingMetric);
    assert_eq!(
        engine.run_to_completion().unwrap_err(),
        ClusterError::MissingMetric
    );

    let mut engine = seeded_engine(0);
    assert_eq!(engine.step().unwrap_err(), ClusterError::EmptyDataset);
    engine.set_dataset(Vec::<Point2>::new());
    assert_eq!(engine.phase(), Phase::Idle);

    assert!(ClusterEngine::<Point2>::new(EngineConfig::default().with_epsilon(-1.0)).is_err());
}

#[test]
fn test_single_point_dataset() {
    let mut engine = seeded_engine(0);
    engine.set_dataset(vec![Point2::new(2.0, 3.0)]);
    let model = engine.run_to_completion().unwrap();

    assert_eq!(model.k, 1);
    assert_eq!(model.centroids, vec![Point2::new(2.0, 3.0)]);
    assert_eq!(model.error, 0.0);
    assert_eq!(
        engine.phase(),
        Phase::Finished {
            reason: StopReason::Exhausted
        }
    );
}

#[test]
fn test_ndarray_points() {
    let points: Vec<Array1<f64>> = vec![
        array![0.0, 0.0, 0.0],
        array![0.0, 1.0, 0.0],
        array![1.0, 0.0, 1.0],
        array![1.0, 1.0, 1.0],
        array![20.0, 20.0, 20.0],
        array![20.0, 21.0, 20.0],
        array![21.0, 20.0, 21.0],
        array![21.0, 21.0, 21.0],
    ];
    let mut engine = ClusterEngine::<Array1<f64>>::new(EngineConfig::default().with_seed(8))
        .unwrap()
        .with_metric(SquaredEuclidean);
    engine.set_dataset(points);
    let model = engine.run_to_completion().unwrap();

    assert_eq!(model.k, 2);
    assert!(same_partition(
        &model.classification.labels(),
        &[0, 0, 0, 0, 1, 1, 1, 1]
    ));
    for centroid in &model.centroids {
        assert_eq!(centroid.len(), 3);
    }
}

#[test]
fn test_closure_metric() {
    let manhattan = |a: &Point2, b: &Point2| (a.x - b.x).abs() + (a.y - b.y).abs();
    let mut engine = ClusterEngine::<Point2>::new(EngineConfig::default().with_seed(4))
        .unwrap()
        .with_metric(manhattan);
    engine.set_dataset(two_squares());
    let model = engine.run_to_completion().unwrap();

    assert_eq!(model.k, 2);
    assert!(same_partition(
        &model.classification.labels(),
        &[0, 0, 0, 0, 1, 1, 1, 1]
    ));
    assert!((model.error - 8.0).abs() < 1e-9);
}

#[test]
fn test_end_to_end_pipeline() {
    // Create test data
    let test_file = create_test_csv();

    // Load and normalize
    let data = load_and_process_data(test_file.path(), true).unwrap();
    assert_eq!(data.points.len(), 8);
    assert_eq!(data.raw_points, two_squares());

    let mut engine = seeded_engine(17);
    engine.set_dataset(data.points.clone());
    let model = engine.run_to_completion().unwrap();
    assert_eq!(model.k, 2);

    // Centroids map back to the original units
    let mut centroids: Vec<Point2> = model
        .centroids
        .iter()
        .map(|&c| data.unscale_point(c))
        .collect();
    centroids.sort_by(|a, b| a.x.total_cmp(&b.x));
    assert!(close(centroids[0], Point2::new(0.5, 0.5), 1e-6));
    assert!(close(centroids[1], Point2::new(10.5, 10.5), 1e-6));

    // Prediction on a new raw point
    let near_high = data.scale_new_point(Point2::new(12.0, 12.0));
    let cluster = model.predict(&near_high, &SquaredEuclidean);
    assert_eq!(cluster, model.classification.labels()[4]);
}

#[test]
fn test_frames_written_for_every_step() {
    let points = two_squares();
    let dir = tempdir().unwrap();
    let mut writer = FrameWriter::new(dir.path(), &points, 3)
        .unwrap()
        .with_size((40, 40));

    let mut engine = seeded_engine(2);
    engine.set_dataset(points.clone());
    let mut steps = 0;
    while !engine.is_finished() {
        let classification = engine.step().unwrap().clone();
        let written = writer
            .write_step(
                &points,
                &classification,
                engine.previous_centroids(),
                engine.centroids(),
            )
            .unwrap();
        assert!(written == 1 || written == 3);
        steps += 1;
    }

    assert!(writer.frames_written() >= steps);
    for index in 0..writer.frames_written() {
        assert!(writer.frame_path(index).exists());
    }
}

#[test]
fn test_agrees_with_linfa_kmeans() {
    use linfa::prelude::*;
    use linfa_clustering::KMeans;
    use linfa_nn::distance::L2Dist;

    let points = two_squares();
    let n_samples = points.len();
    let mut records = Array2::zeros((n_samples, 2));
    for (mut row, point) in records.outer_iter_mut().zip(&points) {
        row[0] = point.x;
        row[1] = point.y;
    }
    let targets: Array1<usize> = Array1::zeros(n_samples);
    let dataset = Dataset::new(records, targets);

    let reference = KMeans::params_with(2, StdRng::seed_from_u64(42), L2Dist)
        .fit(&dataset)
        .unwrap();
    let reference_labels: Array1<usize> = reference.predict(&dataset);

    let mut engine = seeded_engine(42);
    engine.set_dataset(points);
    let model = engine.run_to_completion().unwrap();

    assert_eq!(model.k, 2);
    assert!(same_partition(
        &model.classification.labels(),
        reference_labels.as_slice().unwrap()
    ));
}

#[test]
fn test_inertia_never_increases_within_k() {
    for seed in 0..20 {
        let points = noisy_groups(seed);
        let mut engine = seeded_engine(seed);
        engine.set_dataset(points.clone());
        let max_iterations = engine.config().max_iterations;

        let mut previous: Option<(usize, f64)> = None;
        while !engine.is_finished() {
            engine.step().unwrap();
            let k = match engine.phase() {
                Phase::Iterating => engine.k(),
                Phase::Converged { k, .. } => k,
                _ => break,
            };
            assert!(engine.iterations() <= max_iterations);

            let error = inertia(
                &points,
                engine.classification(),
                engine.centroids(),
                &SquaredEuclidean,
            );
            if let Some((last_k, last)) = previous {
                if last_k == k {
                    assert!(
                        error <= last + 1e-9 * (1.0 + last),
                        "seed {seed} k {k}: inertia rose {last} -> {error}"
                    );
                }
            }
            if let Phase::Converged { error: reported, .. } = engine.phase() {
                assert!((reported - error).abs() <= 1e-9 * (1.0 + error));
            }
            previous = Some((k, error));
        }
    }
}

#[test]
fn test_duplicate_points_keep_every_cluster_populated() {
    let mut points = vec![Point2::new(1.0, 1.0); 6];
    points.extend(vec![Point2::new(9.0, 9.0); 3]);

    for seed in 0..20 {
        let mut engine = seeded_engine(seed);
        engine.set_dataset(points.clone());
        let model = engine.run_to_completion().unwrap();

        assert!(model.classification.is_partition_of(points.len()));
        assert!(model.cluster_sizes().iter().all(|&size| size > 0), "seed {seed}");
        assert_eq!(model.k, 2, "seed {seed}");
        assert_eq!(model.error, 0.0);

        let mut sizes = model.cluster_sizes();
        sizes.sort_unstable();
        assert_eq!(sizes, vec![3, 6]);
    }
}
