//! World entity model.
//!
//! Entities are owned by the [`crate::world::World`] arena and mutated only
//! under their lock. The model is deliberately narrow: just the surface the
//! scan encounter touches (position, combat flags, posture, cooldowns, and
//! the per-subject active-session slot).

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::models::geometry::Vec3;
use crate::session::ScanSession;

/// Stable identifier for a world entity; allocated by the arena and never
/// reused within a world's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u64);

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Broad classification of a world entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// A player-controlled actor; the only valid scan subject.
    #[default]
    Player,
    /// The transient scan drone an encounter spawns.
    Drone,
    /// A reinforcement dropship.
    Dropship,
    /// A reinforcement trooper.
    Trooper,
}

/// Animation posture for an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Posture {
    /// Normal standing posture.
    #[default]
    Upright,
    /// Departure posture (drone folding up for takeoff).
    Departing,
}

/// Kind key for the per-subject active-session slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionKind {
    /// A wild contraband scan encounter.
    ContrabandScan,
}

/// A world entity.
#[derive(Debug, Clone, Default)]
#[allow(clippy::struct_excessive_bools)] // Mirrors the wire-level status flags.
pub struct Entity {
    /// Template this entity was spawned from.
    pub template: String,
    /// Classification.
    pub kind: EntityKind,
    /// Current world position.
    pub position: Vec3,
    /// Facing, radians in the horizontal plane.
    pub heading: f32,
    /// Current animation posture.
    pub posture: Posture,
    /// Whether the entity is actively fighting.
    pub in_combat: bool,
    /// Whether the entity is dead (dead entities linger until destroyed).
    pub dead: bool,
    /// Whether the entity is riding a mount.
    pub mounted: bool,
    /// Entity this one is following, if any.
    pub follow_target: Option<EntityId>,
    /// Whether the entity has been leashed back to its spawn behavior.
    pub leashed: bool,
    /// Named cooldown markers with their expiry instants.
    cooldowns: HashMap<String, DateTime<Utc>>,
    /// Active sessions keyed by kind; at most one per kind.
    sessions: HashMap<SessionKind, Arc<ScanSession>>,
}

impl Entity {
    /// Construct an entity of the given kind at a position.
    #[must_use]
    pub fn new(kind: EntityKind, template: impl Into<String>, position: Vec3) -> Self {
        Self {
            template: template.into(),
            kind,
            position,
            ..Self::default()
        }
    }

    /// Whether this entity is a valid scan subject.
    #[must_use]
    pub fn is_player(&self) -> bool {
        self.kind == EntityKind::Player
    }

    /// Apply a named cooldown marker expiring `duration` from now.
    pub fn update_cooldown(&mut self, name: &str, duration: Duration) {
        self.cooldowns.insert(name.to_owned(), Utc::now() + duration);
    }

    /// Whether a named cooldown marker is still in effect.
    #[must_use]
    pub fn is_on_cooldown(&self, name: &str) -> bool {
        self.cooldowns.get(name).is_some_and(|expiry| *expiry > Utc::now())
    }

    /// Register an active session of the given kind, returning any prior
    /// session that was evicted from the slot.
    ///
    /// The caller is responsible for cancelling the evicted session *after*
    /// releasing this entity's lock; `ScanSession::cancel` re-acquires it to
    /// deregister.
    pub fn register_session(
        &mut self,
        kind: SessionKind,
        session: Arc<ScanSession>,
    ) -> Option<Arc<ScanSession>> {
        self.sessions.insert(kind, session)
    }

    /// The active session of the given kind, if any.
    #[must_use]
    pub fn active_session(&self, kind: SessionKind) -> Option<Arc<ScanSession>> {
        self.sessions.get(&kind).cloned()
    }

    /// Drop the session slot of the given kind, but only if it still holds
    /// `session`. A replacement registered by a newer session stays put.
    pub fn drop_session_if(&mut self, kind: SessionKind, session: &ScanSession) {
        if let Some(current) = self.sessions.get(&kind) {
            if std::ptr::eq(Arc::as_ptr(current), session) {
                self.sessions.remove(&kind);
            }
        }
    }
}
