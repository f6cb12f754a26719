//! Planar geometry primitives used for junction placement and published routes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A point in diagram coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
}

impl Point {
    /// Creates a new point.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Rectilinear distance to another point.
    pub fn manhattan(&self, other: &Point) -> f64 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    /// Bit pattern of both coordinates, usable as an ordered map key.
    ///
    /// `-0.0` is folded into `0.0` so equal coordinates share a key.
    pub fn bit_key(&self) -> (u64, u64) {
        ((self.x + 0.0).to_bits(), (self.y + 0.0).to_bits())
    }

    /// Component-wise median of a set of points.
    ///
    /// For an even count the lower median is taken so the result is always one
    /// of the input coordinates. Returns `None` for an empty slice.
    pub fn median(points: &[Point]) -> Option<Point> {
        if points.is_empty() {
            return None;
        }
        let mut xs: Vec<f64> = points.iter().map(|p| p.x).collect();
        let mut ys: Vec<f64> = points.iter().map(|p| p.y).collect();
        xs.sort_by(f64::total_cmp);
        ys.sort_by(f64::total_cmp);
        let mid = (points.len() - 1) / 2;
        Some(Point::new(xs[mid], ys[mid]))
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}
