//! Point loading from `x,y` text files and z-score normalization

use crate::point::Point2;
use anyhow::Context;
use ndarray::{Array1, Array2, Axis};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Loaded points, ready for the engine
#[derive(Debug, Clone)]
pub struct PointData {
    /// Points fed to the engine (normalized unless loading was raw)
    pub points: Vec<Point2>,
    /// Points exactly as read from the file
    pub raw_points: Vec<Point2>,
    /// Scaler fitted on the raw points, `None` for raw loading
    pub scaler: Option<StandardScaler>,
}

impl PointData {
    /// Map a raw point into the space the engine works in
    pub fn scale_new_point(&self, point: Point2) -> Point2 {
        match &self.scaler {
            Some(scaler) => scaler.transform_point(point),
            None => point,
        }
    }

    /// Map an engine-space point (e.g. a centroid) back to raw units
    pub fn unscale_point(&self, point: Point2) -> Point2 {
        match &self.scaler {
            Some(scaler) => scaler.inverse_transform_point(point),
            None => point,
        }
    }
}

/// Per-dimension z-score scaler using the population standard deviation
#[derive(Debug, Clone, PartialEq)]
pub struct StandardScaler {
    pub mean: Array1<f64>,
    pub std: Array1<f64>,
}

impl StandardScaler {
    /// Fit on the rows of `features`
    ///
    /// A dimension without spread gets a unit divisor, so it is centered but
    /// not scaled.
    pub fn fit(features: &Array2<f64>) -> crate::Result<Self> {
        let mean = features
            .mean_axis(Axis(0))
            .context("cannot fit a scaler on zero samples")?;
        let std = features
            .std_axis(Axis(0), 0.0)
            .mapv(|s| if s > 0.0 && s.is_finite() { s } else { 1.0 });
        Ok(Self { mean, std })
    }

    pub fn transform(&self, features: &Array2<f64>) -> Array2<f64> {
        (features - &self.mean) / &self.std
    }

    pub fn transform_point(&self, point: Point2) -> Point2 {
        Point2::new(
            (point.x - self.mean[0]) / self.std[0],
            (point.y - self.mean[1]) / self.std[1],
        )
    }

    pub fn inverse_transform_point(&self, point: Point2) -> Point2 {
        Point2::new(
            point.x * self.std[0] + self.mean[0],
            point.y * self.std[1] + self.mean[1],
        )
    }
}

/// Parse one `x,y` line; `None` for anything malformed
pub fn parse_point(line: &str) -> Option<Point2> {
    let mut fields = line.split(',');
    let x = fields.next()?.trim().parse::<f64>().ok()?;
    let y = fields.next()?.trim().parse::<f64>().ok()?;
    if fields.next().is_some() {
        return None;
    }
    let point = Point2::new(x, y);
    point.is_finite().then_some(point)
}

/// Read every well-formed `x,y` line, silently skipping the rest
///
/// Lines are split on raw bytes, so a line that is not valid UTF-8 is skipped
/// like any other malformed line instead of ending the read.
pub fn parse_points<R: BufRead>(reader: R) -> Vec<Point2> {
    reader
        .split(b'\n')
        .map_while(Result::ok)
        .filter_map(|bytes| parse_point(&String::from_utf8_lossy(&bytes)))
        .collect()
}

/// Load points from a text file with one `x,y` pair per line
pub fn load_points(file_path: impl AsRef<Path>) -> crate::Result<Vec<Point2>> {
    let file_path = file_path.as_ref();
    let file = File::open(file_path)
        .with_context(|| format!("failed to open {}", file_path.display()))?;
    Ok(parse_points(BufReader::new(file)))
}

pub fn points_to_array(points: &[Point2]) -> Array2<f64> {
    let mut features = Array2::zeros((points.len(), 2));
    for (mut row, point) in features.outer_iter_mut().zip(points) {
        row[0] = point.x;
        row[1] = point.y;
    }
    features
}

pub fn array_to_points(features: &Array2<f64>) -> Vec<Point2> {
    features
        .outer_iter()
        .map(|row| Point2::new(row[0], row[1]))
        .collect()
}

/// Z-score `points` per dimension; returns the normalized points and the scaler
pub fn normalize(points: &[Point2]) -> crate::Result<(Vec<Point2>, StandardScaler)> {
    let features = points_to_array(points);
    let scaler = StandardScaler::fit(&features)?;
    let normalized = array_to_points(&scaler.transform(&features));
    Ok((normalized, scaler))
}

/// Load a point file and optionally normalize it
///
/// # Arguments
/// * `file_path` - Path to the `x,y` file
/// * `normalize_points` - Whether to z-score the points before clustering
///
/// # Returns
/// * `PointData` with engine-space points and the raw originals
pub fn load_and_process_data(
    file_path: impl AsRef<Path>,
    normalize_points: bool,
) -> crate::Result<PointData> {
    let file_path = file_path.as_ref();
    let raw_points = load_points(file_path)?;
    if raw_points.is_empty() {
        anyhow::bail!("no valid points found in {}", file_path.display());
    }

    if !normalize_points {
        return Ok(PointData {
            points: raw_points.clone(),
            raw_points,
            scaler: None,
        });
    }

    let (points, scaler) = normalize(&raw_points)?;
    Ok(PointData {
        points,
        raw_points,
        scaler: Some(scaler),
    })
}
