//! Point capabilities required by the engine, and a planar point type

use std::ops::{Add, Div, Mul, Sub};

/// What the engine needs from a point: combination and scaling by a count
///
/// Distances are never computed through this trait; they come from the
/// injected [`Metric`](crate::metric::Metric). Any type with the right
/// operator impls qualifies automatically, including `ndarray::Array1<f64>`.
pub trait Point: Clone + Add<Output = Self> + Div<f64, Output = Self> {}

impl<T> Point for T where T: Clone + Add<Output = T> + Div<f64, Output = T> {}

/// Arithmetic mean of the points at `indices`, or `None` when `indices` is empty
pub fn mean_of<T: Point>(dataset: &[T], indices: &[usize]) -> Option<T> {
    let (&first, rest) = indices.split_first()?;
    let sum = rest
        .iter()
        .fold(dataset[first].clone(), |acc, &i| acc + dataset[i].clone());
    Some(sum / indices.len() as f64)
}

/// A point in the plane
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Linear interpolation from `self` (t = 0) to `other` (t = 1)
    pub fn lerp(self, other: Point2, t: f64) -> Point2 {
        (other - self) * t + self
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<(f64, f64)> for Point2 {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

impl Add for Point2 {
    type Output = Point2;

    fn add(self, rhs: Point2) -> Point2 {
        Point2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point2 {
    type Output = Point2;

    fn sub(self, rhs: Point2) -> Point2 {
        Point2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Point2 {
    type Output = Point2;

    fn mul(self, rhs: f64) -> Point2 {
        Point2::new(self.x * rhs, self.y * rhs)
    }
}

impl Div<f64> for Point2 {
    type Output = Point2;

    fn div(self, rhs: f64) -> Point2 {
        Point2::new(self.x / rhs, self.y / rhs)
    }
}
