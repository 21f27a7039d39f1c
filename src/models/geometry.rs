//! Minimal world-space geometry used for placement and proximity checks.

use serde::{Deserialize, Serialize};

/// A point in world space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    /// East-west axis.
    pub x: f32,
    /// Vertical axis.
    pub y: f32,
    /// North-south axis.
    pub z: f32,
}

impl Vec3 {
    /// Construct a point from its components.
    #[must_use]
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Straight-line distance to another point.
    #[must_use]
    pub fn distance_to(&self, other: &Self) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// The point `distance` away along `heading` (radians, measured in the
    /// horizontal plane).
    #[must_use]
    pub fn offset_by(&self, heading: f32, distance: f32) -> Self {
        Self {
            x: self.x + heading.sin() * distance,
            y: self.y,
            z: self.z + heading.cos() * distance,
        }
    }
}

/// Heading pointing the opposite way, normalized to `[0, 2π)`.
#[must_use]
pub fn opposite_heading(heading: f32) -> f32 {
    (heading + std::f32::consts::PI).rem_euclid(std::f32::consts::TAU)
}
