//! Plane geometry for node placement and broadcast range checks.
//!
//! Contains:
//! - `Position`, the integer 2-D coordinate nodes live on
//! - Squared distance helpers (avoids a sqrt in range checks)
//! - Vector arithmetic used by hosts for layout offsets

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Div, Mul, Sub};

/// Integer 2-D coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Build a position from polar coordinates, truncating toward zero.
    pub fn from_polar(modulus: f64, angle: f64) -> Self {
        Self {
            x: (modulus * angle.cos()) as i32,
            y: (modulus * angle.sin()) as i32,
        }
    }

    /// Euclidean distance to `other`.
    pub fn distance_to(&self, other: &Position) -> f64 {
        (distance2(self, other) as f64).sqrt()
    }

    /// Length of the vector from the origin to this position.
    pub fn modulus(&self) -> f64 {
        (self.x as f64).hypot(self.y as f64)
    }

    /// Angle of the vector from the origin, in radians.
    pub fn angle(&self) -> f64 {
        (self.y as f64).atan2(self.x as f64)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl Add for Position {
    type Output = Position;

    fn add(self, other: Position) -> Position {
        Position::new(self.x + other.x, self.y + other.y)
    }
}

impl Sub for Position {
    type Output = Position;

    fn sub(self, other: Position) -> Position {
        Position::new(self.x - other.x, self.y - other.y)
    }
}

impl Mul<i32> for Position {
    type Output = Position;

    fn mul(self, factor: i32) -> Position {
        Position::new(self.x * factor, self.y * factor)
    }
}

/// Integer division truncating toward zero on each axis.
impl Div<i32> for Position {
    type Output = Position;

    fn div(self, divisor: i32) -> Position {
        Position::new(self.x / divisor, self.y / divisor)
    }
}

/// Squared Euclidean distance, computed in `i128` so it is exact for any
/// pair of `i32` coordinates.
pub fn distance2(a: &Position, b: &Position) -> i128 {
    let dx = a.x as i128 - b.x as i128;
    let dy = a.y as i128 - b.y as i128;
    dx * dx + dy * dy
}

/// Inclusive range test: is `target` at most `radius` away from `center`?
///
/// Compares squared values so a target sitting exactly on the boundary is
/// always in range.
pub fn within_range(center: &Position, target: &Position, radius: u32) -> bool {
    let r = radius as i128;
    distance2(center, target) <= r * r
}
