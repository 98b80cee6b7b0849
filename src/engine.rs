//! The clustering engine: a resumable state machine over K and Lloyd passes
//!
//! [`ClusterEngine::step`] performs one bounded unit of work per call, either
//! seeding the current K or running one assign/recompute pass, so a driver
//! such as an animation loop can observe every intermediate centroid set.
//! [`ClusterEngine::run_to_completion`] drives the same transitions until the
//! search over K ends, which keeps both surfaces in agreement for a seeded
//! generator.
//!
//! ```text
//! Idle --set_dataset--> Seeding --step--> Iterating --step--> Iterating
//!                                            |
//!                                   converged, K advances
//!                                            v
//!                       Iterating <--step-- Converged
//!
//! Iterating --converged, elbow or K = N--> Finished
//! ```

use crate::convergence::{self, DEFAULT_EPSILON};
use crate::error::{ClusterError, ClusterResult};
use crate::metric::Metric;
use crate::model::{Classification, ClusterModel};
use crate::partition;
use crate::point::Point;
use crate::seed;
use crate::selector::{Decision, ElbowThreshold, Evaluation, KSelector, StopReason};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info, warn};

/// Default cap on Lloyd passes for one K
pub const DEFAULT_MAX_ITERATIONS: usize = 300;

/// Tunable parameters of the engine
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Largest centroid movement still counted as converged
    pub epsilon: f64,
    /// Lloyd passes allowed per K before the current centroids are accepted
    pub max_iterations: usize,
    /// When the elbow search stops growing K
    pub elbow: ElbowThreshold,
    /// Seed for the generator behind the first seeding draw
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            epsilon: DEFAULT_EPSILON,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            elbow: ElbowThreshold::default(),
            seed: None,
        }
    }
}

impl EngineConfig {
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_elbow(mut self, elbow: ElbowThreshold) -> Self {
        self.elbow = elbow;
        self
    }

    /// Set random seed for reproducibility
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> ClusterResult<()> {
        if !self.epsilon.is_finite() || self.epsilon < 0.0 {
            return Err(ClusterError::InvalidParameter {
                name: "epsilon",
                message: "must be finite and non-negative",
            });
        }
        if self.max_iterations == 0 {
            return Err(ClusterError::InvalidParameter {
                name: "max_iterations",
                message: "must be at least 1",
            });
        }
        self.elbow.validate()
    }
}

/// Where the engine is in its search
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Phase {
    /// No dataset to work on
    Idle,
    /// The next step seeds the current K
    Seeding,
    /// Lloyd passes are running for the current K
    Iterating,
    /// K `k` converged with inertia `error`; the next step seeds K + 1
    Converged { k: usize, error: f64 },
    /// The search ended; further steps change nothing
    Finished { reason: StopReason },
}

impl Phase {
    pub fn is_finished(&self) -> bool {
        matches!(self, Phase::Finished { .. })
    }
}

/// Everything a run mutates. Owned by one engine and touched only by `step`
#[derive(Debug, Clone)]
pub(crate) struct ClusteringState<T> {
    phase: Phase,
    k: usize,
    centroids: Vec<T>,
    previous_centroids: Vec<T>,
    classification: Classification,
    selector: KSelector<T>,
    iterations: usize,
    last_movement: Option<f64>,
    stop_requested: bool,
    result: Option<ClusterModel<T>>,
}

impl<T: Point> ClusteringState<T> {
    fn new(elbow: ElbowThreshold, has_data: bool) -> Self {
        Self {
            phase: if has_data { Phase::Seeding } else { Phase::Idle },
            k: 1,
            centroids: Vec::new(),
            previous_centroids: Vec::new(),
            classification: Classification::default(),
            selector: KSelector::new(elbow),
            iterations: 0,
            last_movement: None,
            stop_requested: false,
            result: None,
        }
    }

    fn begin_k<R: rand::Rng>(
        &mut self,
        dataset: &[T],
        metric: &dyn Metric<T>,
        rng: &mut R,
    ) -> ClusterResult<()> {
        let seeds = seed::seed(dataset, self.k, metric, rng)?;
        let mut classification = partition::classify(dataset, &seeds, metric);
        partition::repair_empty_clusters(dataset, &seeds, &mut classification, metric)?;

        self.previous_centroids = seeds.clone();
        self.centroids = seeds;
        self.classification = classification;
        self.iterations = 0;
        self.last_movement = None;
        self.phase = Phase::Iterating;
        debug!(k = self.k, "seeded centroids");
        Ok(())
    }

    fn lloyd_pass(
        &mut self,
        dataset: &[T],
        metric: &dyn Metric<T>,
        config: &EngineConfig,
    ) -> ClusterResult<()> {
        let mut classification = partition::classify(dataset, &self.centroids, metric);
        partition::repair_empty_clusters(dataset, &self.centroids, &mut classification, metric)?;
        let next = partition::recompute(dataset, &classification)?;
        let movement = convergence::max_movement(&self.centroids, &next, metric)?;

        self.iterations += 1;
        self.previous_centroids = std::mem::replace(&mut self.centroids, next);
        self.classification = classification;
        self.last_movement = Some(movement);
        debug!(k = self.k, iteration = self.iterations, movement, "lloyd pass");

        let converged = movement <= config.epsilon;
        if !converged {
            if self.iterations < config.max_iterations {
                return Ok(());
            }
            warn!(
                k = self.k,
                iterations = self.iterations,
                movement,
                "iteration cap reached, accepting current centroids"
            );
        }

        let error = partition::inertia(dataset, &self.classification, &self.centroids, metric);
        info!(k = self.k, iterations = self.iterations, error, "k converged");
        let evaluation = Evaluation {
            k: self.k,
            centroids: self.centroids.clone(),
            classification: self.classification.clone(),
            error,
        };

        match self.selector.record(evaluation, dataset.len()) {
            Decision::Advance { next_k } => {
                self.phase = Phase::Converged { k: self.k, error };
                self.k = next_k;
            }
            Decision::Stop { reason, selected } => self.finish(reason, selected.into()),
        }
        Ok(())
    }

    fn finish(&mut self, reason: StopReason, model: ClusterModel<T>) {
        info!(k = model.k, error = model.error, ?reason, "search finished");
        self.k = model.k;
        self.centroids = model.centroids.clone();
        self.previous_centroids = model.centroids.clone();
        self.classification = model.classification.clone();
        self.result = Some(model);
        self.phase = Phase::Finished { reason };
    }

    /// Stop at the latest converged K, or keep the in-progress state if none
    fn freeze(&mut self, dataset: &[T], metric: &dyn Metric<T>) {
        if let Some(latest) = self.selector.latest().cloned() {
            self.finish(StopReason::Cancelled, latest.into());
            return;
        }

        if !self.centroids.is_empty() {
            let error =
                partition::inertia(dataset, &self.classification, &self.centroids, metric);
            self.result = Some(ClusterModel {
                k: self.k,
                centroids: self.centroids.clone(),
                classification: self.classification.clone(),
                error,
            });
        }
        info!(k = self.k, "search cancelled before any k converged");
        self.phase = Phase::Finished {
            reason: StopReason::Cancelled,
        };
    }
}

/// Steppable K-means with automatic K selection over points of type `T`
///
/// One engine drives one run at a time; concurrent runs need separate engines
pub struct ClusterEngine<T> {
    config: EngineConfig,
    metric: Option<Box<dyn Metric<T> + Send>>,
    dataset: Vec<T>,
    state: ClusteringState<T>,
    rng: StdRng,
}

impl<T: Point> ClusterEngine<T> {
    /// Create an engine with no metric and no data
    pub fn new(config: EngineConfig) -> ClusterResult<Self> {
        config.validate()?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Self {
            state: ClusteringState::new(config.elbow, false),
            config,
            metric: None,
            dataset: Vec::new(),
            rng,
        })
    }

    /// Builder form of [`set_metric`](Self::set_metric)
    pub fn with_metric<M>(mut self, metric: M) -> Self
    where
        M: Metric<T> + Send + 'static,
    {
        self.set_metric(metric);
        self
    }

    /// Set the distance function. Required before any run
    pub fn set_metric<M>(&mut self, metric: M)
    where
        M: Metric<T> + Send + 'static,
    {
        self.metric = Some(Box::new(metric));
    }

    /// Replace the dataset and discard all run state
    pub fn set_dataset(&mut self, points: impl Into<Vec<T>>) {
        self.dataset = points.into();
        debug!(n_points = self.dataset.len(), "dataset replaced");
        self.reset();
    }

    fn reset(&mut self) {
        if let Some(seed) = self.config.seed {
            self.rng = StdRng::seed_from_u64(seed);
        }
        self.state = ClusteringState::new(self.config.elbow, !self.dataset.is_empty());
    }

    /// Advance the search by one unit of work and return the current classification
    ///
    /// Seeds the current K if it has no centroids yet, otherwise runs one
    /// assign/recompute pass. Once finished, further calls change nothing.
    pub fn step(&mut self) -> ClusterResult<&Classification> {
        let Self {
            config,
            metric,
            dataset,
            state,
            rng,
        } = self;
        let metric = metric.as_deref().ok_or(ClusterError::MissingMetric)?;
        if dataset.is_empty() {
            return Err(ClusterError::EmptyDataset);
        }

        match state.phase {
            Phase::Finished { .. } => {}
            _ if state.stop_requested => state.freeze(dataset, metric),
            Phase::Idle | Phase::Seeding | Phase::Converged { .. } => {
                state.begin_k(dataset, metric, rng)?
            }
            Phase::Iterating => state.lloyd_pass(dataset, metric, config)?,
        }

        Ok(&state.classification)
    }

    /// Run a fresh search to the end and return the selected model
    pub fn run_to_completion(&mut self) -> ClusterResult<ClusterModel<T>> {
        if self.metric.is_none() {
            return Err(ClusterError::MissingMetric);
        }
        if self.dataset.is_empty() {
            return Err(ClusterError::EmptyDataset);
        }

        self.reset();
        while !self.state.phase.is_finished() {
            self.step()?;
        }
        self.state.result.clone().ok_or(ClusterError::EmptyDataset)
    }

    /// Ask the engine to stop; the next `step` freezes the run
    pub fn request_stop(&mut self) {
        self.state.stop_requested = true;
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn metric(&self) -> Option<&(dyn Metric<T> + Send)> {
        self.metric.as_deref()
    }

    pub fn dataset(&self) -> &[T] {
        &self.dataset
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn is_finished(&self) -> bool {
        self.state.phase.is_finished()
    }

    /// The K currently being evaluated, or the selected K once finished
    pub fn k(&self) -> usize {
        self.state.k
    }

    pub fn centroids(&self) -> &[T] {
        &self.state.centroids
    }

    /// Centroids before the latest step, for interpolating between steps
    pub fn previous_centroids(&self) -> &[T] {
        &self.state.previous_centroids
    }

    pub fn classification(&self) -> &Classification {
        &self.state.classification
    }

    /// Lloyd passes run for the current K
    pub fn iterations(&self) -> usize {
        self.state.iterations
    }

    /// Largest centroid movement of the latest pass
    pub fn last_movement(&self) -> Option<f64> {
        self.state.last_movement
    }

    /// Inertia of the latest converged K, or of the selected K once finished
    pub fn current_error(&self) -> Option<f64> {
        match &self.state.result {
            Some(model) => Some(model.error),
            None => self.state.selector.history().current(),
        }
    }

    /// The selected model, once finished
    pub fn model(&self) -> Option<&ClusterModel<T>> {
        self.state.result.as_ref()
    }
}
