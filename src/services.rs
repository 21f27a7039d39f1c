//! Collaborator contracts consumed by the scan session.
//!
//! The session never reaches into these subsystems' internals; it talks to
//! them through narrow traits so tests (and other zones) can substitute
//! their own implementations.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::models::Vec3;
use crate::world::EntityHandle;

/// Zone capability service: scan outcome policy and cooldown lengths.
///
/// A zone without this service registered cannot host scan encounters;
/// session initialization fails against such a zone.
pub trait CapabilityService: Send + Sync {
    /// Number of contraband items found on the subject. Positive means the
    /// scan comes back positive.
    fn evaluate_outcome(&self, subject: &EntityHandle) -> i64;

    /// How long the subject is exempt from further scans once one starts.
    fn scan_cooldown(&self) -> Duration;
}

/// Fire-and-forget messaging toward players. No return values are consumed;
/// a dropped message is not an error the session cares about.
pub trait Messaging: Send + Sync {
    /// Send a system message to the subject, identified by message key.
    fn notify(&self, subject: &EntityHandle, key: &str);

    /// Show fly text above an entity, identified by message key.
    fn show_fly_text(&self, entity: &EntityHandle, key: &str);

    /// Play a client effect for the subject at a world position.
    fn play_effect_at(&self, subject: &EntityHandle, effect: &str, position: Vec3);
}

/// Messaging implementation that only logs; useful as a default wiring when
/// no client transport is attached.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMessaging;

impl Messaging for LogMessaging {
    fn notify(&self, subject: &EntityHandle, key: &str) {
        info!(subject = %subject.id(), key, "system message");
    }

    fn show_fly_text(&self, entity: &EntityHandle, key: &str) {
        info!(entity = %entity.id(), key, "fly text");
    }

    fn play_effect_at(&self, subject: &EntityHandle, effect: &str, position: Vec3) {
        info!(subject = %subject.id(), effect, ?position, "client effect");
    }
}

/// Shared handles to every collaborator the session needs.
#[derive(Clone)]
pub struct Collaborators {
    /// Messaging transport toward the subject's client.
    pub messaging: Arc<dyn Messaging>,
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}

impl Default for Collaborators {
    fn default() -> Self {
        Self {
            messaging: Arc::new(LogMessaging),
        }
    }
}
