//! Spatial placement queries.

use crate::models::Vec3;

/// Zone spatial query service used to place the landing anchor.
pub trait SpatialService: Send + Sync {
    /// A point in sight of `origin`, between `min_distance` and
    /// `max_distance` away along `heading`, with at least `clearance` of
    /// open ground around it.
    fn in_sight_point(
        &self,
        origin: Vec3,
        heading: f32,
        min_distance: f32,
        max_distance: f32,
        clearance: f32,
    ) -> Vec3;
}

/// Deterministic spatial service: places the point straight ahead at the
/// midpoint of the allowed distance band. Suitable for flat terrain and for
/// tests; a real zone would substitute its terrain-aware implementation.
#[derive(Debug, Default, Clone, Copy)]
pub struct LineOfSightSpatial;

impl SpatialService for LineOfSightSpatial {
    fn in_sight_point(
        &self,
        origin: Vec3,
        heading: f32,
        min_distance: f32,
        max_distance: f32,
        _clearance: f32,
    ) -> Vec3 {
        let distance = (min_distance + max_distance) / 2.0;
        origin.offset_by(heading, distance)
    }
}
