//! Registry of static spawn points for large-template arrivals.
//!
//! Dropships cannot land anywhere; zones register fixed landing pads and
//! the encounter asks for the nearest free one within a search radius.

use std::sync::Mutex;

use crate::models::Vec3;

/// Classification of a registered spawn point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnPointKind {
    /// A pad large enough for a reinforcement dropship.
    Dropship,
}

/// A placed spawn point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnPoint {
    /// World position of the point.
    pub position: Vec3,
    /// Facing for entities spawned there, radians.
    pub heading: f32,
}

struct Registered {
    kind: SpawnPointKind,
    point: SpawnPoint,
    in_use: bool,
}

/// Zone-owned set of spawn points.
#[derive(Default)]
pub struct SpawnPointRegistry {
    points: Mutex<Vec<Registered>>,
}

impl std::fmt::Debug for SpawnPointRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpawnPointRegistry").finish_non_exhaustive()
    }
}

impl SpawnPointRegistry {
    /// Register a spawn point.
    pub fn register(&self, kind: SpawnPointKind, position: Vec3, heading: f32) {
        let mut points = self.points_locked();
        points.push(Registered {
            kind,
            point: SpawnPoint { position, heading },
            in_use: false,
        });
    }

    /// Claim the nearest free spawn point of `kind` within `radius` of
    /// `origin`, or `None` if every candidate is taken or out of range.
    /// A claimed point stays unavailable until [`release`](Self::release).
    #[must_use]
    pub fn find_free_spawn_point(
        &self,
        origin: Vec3,
        kind: SpawnPointKind,
        radius: f32,
    ) -> Option<SpawnPoint> {
        let mut points = self.points_locked();
        let mut best: Option<(usize, f32)> = None;
        for (index, registered) in points.iter().enumerate() {
            if registered.kind != kind || registered.in_use {
                continue;
            }
            let distance = registered.point.position.distance_to(&origin);
            if distance > radius {
                continue;
            }
            if best.is_none_or(|(_, d)| distance < d) {
                best = Some((index, distance));
            }
        }
        let (index, _) = best?;
        points[index].in_use = true;
        Some(points[index].point)
    }

    /// Release a previously claimed spawn point.
    pub fn release(&self, point: SpawnPoint) {
        let mut points = self.points_locked();
        if let Some(registered) = points
            .iter_mut()
            .find(|registered| registered.in_use && registered.point == point)
        {
            registered.in_use = false;
        }
    }

    fn points_locked(&self) -> std::sync::MutexGuard<'_, Vec<Registered>> {
        match self.points.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
