//! Pluggable distance functions

use crate::point::Point2;
use ndarray::Array1;

/// A two-argument distance over the point type
///
/// Symmetry and non-negativity are the caller's contract; the engine does not
/// check them. Every `Fn(&T, &T) -> f64` is a metric.
pub trait Metric<T> {
    fn distance(&self, a: &T, b: &T) -> f64;
}

impl<T, F> Metric<T> for F
where
    F: Fn(&T, &T) -> f64,
{
    fn distance(&self, a: &T, b: &T) -> f64 {
        self(a, b)
    }
}

/// Squared Euclidean distance
#[derive(Debug, Clone, Copy, Default)]
pub struct SquaredEuclidean;

/// Euclidean distance
#[derive(Debug, Clone, Copy, Default)]
pub struct Euclidean;

impl Metric<Point2> for SquaredEuclidean {
    fn distance(&self, a: &Point2, b: &Point2) -> f64 {
        let dx = a.x - b.x;
        let dy = a.y - b.y;
        dx * dx + dy * dy
    }
}

impl Metric<Array1<f64>> for SquaredEuclidean {
    fn distance(&self, a: &Array1<f64>, b: &Array1<f64>) -> f64 {
        debug_assert_eq!(a.len(), b.len());
        a.iter()
            .zip(b.iter())
            .map(|(x, y)| {
                let d = x - y;
                d * d
            })
            .sum()
    }
}

impl Metric<Point2> for Euclidean {
    fn distance(&self, a: &Point2, b: &Point2) -> f64 {
        SquaredEuclidean.distance(a, b).sqrt()
    }
}

impl Metric<Array1<f64>> for Euclidean {
    fn distance(&self, a: &Array1<f64>, b: &Array1<f64>) -> f64 {
        SquaredEuclidean.distance(a, b).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_builtin_metrics() {
        let a = Point2::new(0.0, 0.0);
        let b = Point2::new(3.0, 4.0);
        assert_eq!(SquaredEuclidean.distance(&a, &b), 25.0);
        assert_eq!(Euclidean.distance(&a, &b), 5.0);

        let u = array![1.0, 1.0, 1.0];
        let v = array![1.0, 3.0, 1.0];
        assert_eq!(SquaredEuclidean.distance(&u, &v), 4.0);
        assert_eq!(Euclidean.distance(&u, &v), 2.0);
    }

    #[test]
    fn test_closure_is_metric() {
        let manhattan = |a: &Point2, b: &Point2| (a.x - b.x).abs() + (a.y - b.y).abs();
        let metric: &dyn Metric<Point2> = &manhattan;
        assert_eq!(
            metric.distance(&Point2::new(1.0, 1.0), &Point2::new(-1.0, 2.0)),
            3.0
        );
    }
}
