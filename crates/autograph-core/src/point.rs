//! Timestamped, pressure-stamped sample points.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when constructing a point.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum PointError {
    #[error("Point is invalid: ({x}, {y})")]
    NonFinite { x: f64, y: f64 },
}

/// A single accepted input sample in surface (CSS pixel) coordinates.
///
/// Coordinates are always finite. Deserialization goes through [`Point::new`]
/// so stored documents uphold the same invariant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPoint")]
pub struct Point {
    pub x: f64,
    pub y: f64,
    /// Pen pressure in `[0, 1]`; zero when the device reports none.
    pub pressure: f64,
    /// Sample time in milliseconds.
    pub time: u64,
}

#[derive(Deserialize)]
struct RawPoint {
    x: f64,
    y: f64,
    #[serde(default)]
    pressure: f64,
    #[serde(default)]
    time: u64,
}

impl TryFrom<RawPoint> for Point {
    type Error = PointError;

    fn try_from(raw: RawPoint) -> Result<Self, Self::Error> {
        Point::new(raw.x, raw.y, raw.pressure, raw.time)
    }
}

impl Point {
    /// Create a point, rejecting non-finite coordinates.
    pub fn new(x: f64, y: f64, pressure: f64, time: u64) -> Result<Self, PointError> {
        if !x.is_finite() || !y.is_finite() {
            return Err(PointError::NonFinite { x, y });
        }
        let pressure = if pressure.is_finite() { pressure.clamp(0.0, 1.0) } else { 0.0 };
        Ok(Self { x, y, pressure, time })
    }

    /// Euclidean distance to another point.
    pub fn distance_to(&self, other: &Point) -> f64 {
        self.position().distance(other.position())
    }

    /// Speed in units per millisecond travelled since `start`.
    ///
    /// Zero when both samples share a timestamp or time runs backwards.
    pub fn velocity_from(&self, start: &Point) -> f64 {
        let elapsed = self.time.saturating_sub(start.time);
        if elapsed == 0 {
            return 0.0;
        }
        self.distance_to(start) / elapsed as f64
    }

    /// The position as a kurbo point.
    pub fn position(&self) -> kurbo::Point {
        kurbo::Point::new(self.x, self.y)
    }
}
