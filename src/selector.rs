//! Cluster-count selection with the elbow heuristic
//!
//! K grows from 1. After each K converges its inertia is pushed into a
//! three-slot [`ErrorHistory`]. Once three values exist the discrete second
//! difference
//!
//! ```text
//! d2 = e(K) - 2 e(K-1) + e(K-2)
//! ```
//!
//! measures how much the inertia curve still bends. When `|d2|` falls within
//! the threshold the curve is straight from K-2 onward: adding clusters beyond
//! K-2 only buys the same small linear improvement, so K-2 is the elbow and
//! its converged result is kept. The search also ends when K reaches N.

use crate::error::{ClusterError, ClusterResult};
use crate::model::{Classification, ClusterModel};
use std::collections::VecDeque;

/// Default absolute bound on the second difference
pub const DEFAULT_ELBOW_THRESHOLD: f64 = 3.0;

/// How flat the inertia curve must be before K stops growing
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ElbowThreshold {
    /// `|d2| <= bound`, in inertia units
    Absolute(f64),
    /// `|d2| <= fraction * oldest`, scaling with the data's error magnitude
    Relative(f64),
}

impl Default for ElbowThreshold {
    fn default() -> Self {
        ElbowThreshold::Absolute(DEFAULT_ELBOW_THRESHOLD)
    }
}

impl ElbowThreshold {
    pub fn validate(&self) -> ClusterResult<()> {
        let value = match self {
            ElbowThreshold::Absolute(v) | ElbowThreshold::Relative(v) => *v,
        };
        if !value.is_finite() || value < 0.0 {
            return Err(ClusterError::InvalidParameter {
                name: "elbow_threshold",
                message: "must be finite and non-negative",
            });
        }
        Ok(())
    }

    /// Whether `history` has three values whose second difference is flat enough
    pub fn is_flat(&self, history: &ErrorHistory) -> bool {
        let (Some(d2), Some(oldest)) = (history.second_difference(), history.oldest()) else {
            return false;
        };
        match self {
            ElbowThreshold::Absolute(bound) => d2.abs() <= *bound,
            ElbowThreshold::Relative(fraction) => d2.abs() <= fraction * oldest.abs(),
        }
    }
}

/// The three most recent per-K errors: oldest, middle, current
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ErrorHistory {
    oldest: Option<f64>,
    middle: Option<f64>,
    current: Option<f64>,
}

impl ErrorHistory {
    /// Shift every value one slot older and store `error` as current
    pub fn push(&mut self, error: f64) {
        self.oldest = self.middle;
        self.middle = self.current;
        self.current = Some(error);
    }

    pub fn oldest(&self) -> Option<f64> {
        self.oldest
    }

    pub fn middle(&self) -> Option<f64> {
        self.middle
    }

    pub fn current(&self) -> Option<f64> {
        self.current
    }

    /// `current - 2 * middle + oldest`, once all three slots are filled
    pub fn second_difference(&self) -> Option<f64> {
        Some(self.current? - 2.0 * self.middle? + self.oldest?)
    }
}

/// The converged outcome of one K
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation<T> {
    pub k: usize,
    pub centroids: Vec<T>,
    pub classification: Classification,
    pub error: f64,
}

impl<T> From<Evaluation<T>> for ClusterModel<T> {
    fn from(evaluation: Evaluation<T>) -> Self {
        ClusterModel {
            k: evaluation.k,
            centroids: evaluation.centroids,
            classification: evaluation.classification,
            error: evaluation.error,
        }
    }
}

/// Why the search over K ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The second difference fell within the threshold
    Elbow,
    /// K reached the number of points
    Exhausted,
    /// The caller requested a stop
    Cancelled,
}

/// What to do after recording a K
#[derive(Debug, Clone, PartialEq)]
pub enum Decision<T> {
    /// Evaluate `next_k` next
    Advance { next_k: usize },
    /// Stop; `selected` is the final result
    Stop {
        reason: StopReason,
        selected: Evaluation<T>,
    },
}

/// Bookkeeping for the search over K
#[derive(Debug, Clone)]
pub struct KSelector<T> {
    threshold: ElbowThreshold,
    history: ErrorHistory,
    window: VecDeque<Evaluation<T>>,
}

impl<T: Clone> KSelector<T> {
    pub fn new(threshold: ElbowThreshold) -> Self {
        Self {
            threshold,
            history: ErrorHistory::default(),
            window: VecDeque::with_capacity(3),
        }
    }

    pub fn history(&self) -> &ErrorHistory {
        &self.history
    }

    /// Most recently recorded K, if any
    pub fn latest(&self) -> Option<&Evaluation<T>> {
        self.window.back()
    }

    /// Record a converged K out of `n_points` and decide how to continue
    ///
    /// Never proposes a K above `n_points`
    pub fn record(&mut self, evaluation: Evaluation<T>, n_points: usize) -> Decision<T> {
        let k = evaluation.k;
        self.history.push(evaluation.error);
        self.window.push_back(evaluation);
        while self.window.len() > 3 {
            self.window.pop_front();
        }

        if self.threshold.is_flat(&self.history) {
            if let Some(selected) = self.window.front() {
                return Decision::Stop {
                    reason: StopReason::Elbow,
                    selected: selected.clone(),
                };
            }
        }

        if k >= n_points {
            if let Some(selected) = self.window.back() {
                return Decision::Stop {
                    reason: StopReason::Exhausted,
                    selected: selected.clone(),
                };
            }
        }

        Decision::Advance { next_k: k + 1 }
    }
}
