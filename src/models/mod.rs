//! Domain models: world entities and geometry.

pub mod entity;
pub mod geometry;

pub use entity::{Entity, EntityId, EntityKind, Posture, SessionKind};
pub use geometry::Vec3;
