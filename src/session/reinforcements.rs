//! Reinforcement delivery: the one-shot auxiliary task a positive scan
//! schedules.
//!
//! The task's lifecycle is independent of the session that spawned it; the
//! drone may be long gone by the time the dropship arrives, and the
//! dropship still arrives.

use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tracing::{info, warn};

use crate::config::ScanConfig;
use crate::models::{EntityKind, Vec3};
use crate::services::Messaging;
use crate::world::locks::with_entity;
use crate::world::spawn_points::SpawnPoint;
use crate::world::EntityHandle;

/// One-shot task that delivers a dropship and containment troopers near the
/// subject.
pub struct ReinforcementsTask {
    subject: EntityHandle,
    position: Vec3,
    heading: f32,
    /// Pad claimed from the registry, held until the team is delivered.
    claimed: Option<SpawnPoint>,
    messaging: Arc<dyn Messaging>,
    dropship_template: String,
    trooper_template: String,
    trooper_count: u32,
}

impl std::fmt::Debug for ReinforcementsTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReinforcementsTask")
            .field("subject", &self.subject.id())
            .field("position", &self.position)
            .field("trooper_count", &self.trooper_count)
            .finish_non_exhaustive()
    }
}

impl ReinforcementsTask {
    /// Build a task delivering reinforcements at `position`, facing
    /// `heading`. A `claimed` registry pad is released back to the pool
    /// once the delivery has run.
    #[must_use]
    pub fn new(
        subject: EntityHandle,
        position: Vec3,
        heading: f32,
        claimed: Option<SpawnPoint>,
        messaging: Arc<dyn Messaging>,
        config: &ScanConfig,
    ) -> Self {
        Self {
            subject,
            position,
            heading,
            claimed,
            messaging,
            dropship_template: config.dropship_template.clone(),
            trooper_template: config.trooper_template.clone(),
            trooper_count: config.reinforcement_count,
        }
    }

    /// Schedule the delivery to run once after `delay`. Fire and forget.
    pub fn schedule(self, delay: Duration) {
        let Ok(runtime) = Handle::try_current() else {
            warn!("no runtime available to schedule reinforcements");
            // A delivery that can never run must not keep the pad claimed.
            self.release_claim();
            return;
        };
        runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            self.run();
        });
    }

    fn run(self) {
        let Some(world) = self.subject.world() else {
            warn!("world gone before reinforcements arrived");
            return;
        };

        self.messaging.notify(&self.subject, "containment_team_dispatched");

        let dropship = world.spawn(EntityKind::Dropship, &self.dropship_template, self.position);
        with_entity(&dropship, |entity| entity.heading = self.heading);

        // Troopers fan out beside the dropship ramp.
        let mut offset_heading = self.heading;
        for _ in 0..self.trooper_count {
            offset_heading += 0.3;
            let position = self.position.offset_by(offset_heading, 3.0);
            let trooper = world.spawn(EntityKind::Trooper, &self.trooper_template, position);
            with_entity(&trooper, |entity| {
                entity.heading = self.heading;
                entity.follow_target = Some(self.subject.id());
            });
        }

        info!(
            subject = %self.subject.id(),
            troopers = self.trooper_count,
            "reinforcements delivered"
        );

        self.release_claim();
    }

    fn release_claim(&self) {
        if let Some(point) = self.claimed {
            if let Some(world) = self.subject.world() {
                world.spawn_points().release(point);
            }
        }
    }
}
