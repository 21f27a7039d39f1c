//! The scan session controller.
//!
//! One `ScanSession` binds a subject to a scripted drone encounter: the
//! drone is delivered near the subject, closes in, performs a contraband
//! scan, optionally calls in reinforcements, and departs. Every phase is
//! advanced by a single [`TickTask`] firing; the session never blocks.
//!
//! The session holds non-owning [`EntityHandle`]s for both the subject and
//! the drone. Either entity can be destroyed by unrelated code between any
//! two ticks, so every step re-resolves and treats "gone" as an ordinary
//! branch that ends the encounter.

use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use tracing::{error, info, info_span, warn};
use uuid::Uuid;

use crate::config::ScanConfig;
use crate::models::geometry::opposite_heading;
use crate::models::{EntityKind, SessionKind, Vec3};
use crate::services::Collaborators;
use crate::session::reinforcements::ReinforcementsTask;
use crate::session::state::ScanState;
use crate::session::ticker::TickTask;
use crate::world::locks::{with_entity, with_entity_pair};
use crate::world::spawn_points::SpawnPointKind;
use crate::world::EntityHandle;
use crate::{Result, ScanError};

/// Cooldown marker applied to the subject when a scan begins.
pub const SCAN_COOLDOWN_MARKER: &str = "contraband_scan";

/// Mutable session state, guarded by one mutex so `step` and `cancel`
/// serialize against each other.
struct SessionInner {
    state: ScanState,
    time_left: i32,
    anchor: Vec3,
    agent: Option<EntityHandle>,
    initialized: bool,
}

/// Point-in-time view of the subject taken at the top of a step.
#[derive(Clone, Copy)]
struct SubjectSnapshot {
    position: Vec3,
    heading: f32,
}

/// A timed, multi-phase scan encounter against one subject.
pub struct ScanSession {
    id: Uuid,
    subject: EntityHandle,
    config: ScanConfig,
    collaborators: Collaborators,
    ticker: TickTask,
    /// Back-reference to the owning `Arc`, used for registration on the
    /// subject's session slot.
    self_ref: Weak<Self>,
    inner: Mutex<SessionInner>,
}

impl std::fmt::Debug for ScanSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanSession")
            .field("id", &self.id)
            .field("subject", &self.subject.id())
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl ScanSession {
    /// Construct a session bound to `subject`. The session is inert until
    /// [`initialize`](Self::initialize) is called.
    #[must_use]
    pub fn new(
        subject: EntityHandle,
        config: ScanConfig,
        collaborators: Collaborators,
    ) -> Arc<Self> {
        Arc::new_cyclic(|weak: &Weak<Self>| Self {
            id: Uuid::new_v4(),
            subject,
            config,
            collaborators,
            ticker: TickTask::new(weak.clone()),
            self_ref: weak.clone(),
            inner: Mutex::new(SessionInner {
                state: ScanState::Landing,
                time_left: 0,
                anchor: Vec3::default(),
                agent: None,
                initialized: false,
            }),
        })
    }

    /// The session's unique identifier.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Handle to the subject this session is conducted against.
    #[must_use]
    pub fn subject(&self) -> &EntityHandle {
        &self.subject
    }

    /// Current state of the encounter.
    #[must_use]
    pub fn state(&self) -> ScanState {
        self.inner_locked().state
    }

    /// Remaining ticks on the current phase's countdown.
    #[must_use]
    pub fn time_left(&self) -> i32 {
        self.inner_locked().time_left
    }

    /// Handle to the scan drone, once spawned.
    #[must_use]
    pub fn agent(&self) -> Option<EntityHandle> {
        self.inner_locked().agent.clone()
    }

    /// The session's tick task.
    #[must_use]
    pub fn ticker(&self) -> &TickTask {
        &self.ticker
    }

    /// Start the encounter: register on the subject (evicting any prior
    /// scan session), apply the scan cooldown marker, compute the landing
    /// anchor, and arm the first tick. Idempotent — initializing an
    /// already-initialized session only re-arms a disarmed timer.
    ///
    /// # Errors
    ///
    /// Returns `ScanError::Precondition` if the subject is gone or its zone
    /// has no capability service.
    pub fn initialize(&self) -> Result<()> {
        let span = info_span!("initialize_scan", session = %self.id, subject = %self.subject.id());
        let _guard = span.enter();

        let world = self
            .subject
            .world()
            .ok_or_else(|| ScanError::Precondition("world is gone".into()))?;
        if self.subject.resolve().is_none() {
            return Err(ScanError::Precondition("subject is gone".into()));
        }
        let Some(capability) = world.capability_service() else {
            return Err(ScanError::Precondition(
                "zone has no capability service".into(),
            ));
        };
        let me = self
            .self_ref
            .upgrade()
            .ok_or_else(|| ScanError::Precondition("session is being dropped".into()))?;

        let evicted = {
            let mut inner = self.inner_locked();

            if !self.ticker.is_scheduled() {
                self.ticker.schedule(self.tick_delay());
            }

            if inner.initialized {
                return Ok(());
            }

            let cooldown = chrono::Duration::from_std(capability.scan_cooldown())
                .unwrap_or_else(|_| chrono::Duration::zero());

            let evicted = with_entity(&self.subject, |subject| {
                subject.update_cooldown(SCAN_COOLDOWN_MARKER, cooldown);
                let prior =
                    subject.register_session(SessionKind::ContrabandScan, Arc::clone(&me));

                inner.anchor = world.spatial_service().map_or(subject.position, |spatial| {
                    spatial.in_sight_point(
                        subject.position,
                        subject.heading,
                        self.config.anchor_min_distance,
                        self.config.anchor_max_distance,
                        self.config.anchor_clearance,
                    )
                });

                prior
            })
            .ok_or_else(|| ScanError::Precondition("subject is gone".into()))?;

            inner.initialized = true;
            info!(anchor = ?inner.anchor, "scan session initialized");
            evicted
        };

        // The evicted session's cancel re-acquires the subject lock; run it
        // only after every lock above is released.
        if let Some(prior) = evicted {
            if !Arc::ptr_eq(&prior, &me) {
                info!(evicted = %prior.id, "evicting prior scan session");
                prior.cancel();
            }
        }

        Ok(())
    }

    /// Perform one state-machine step. Invoked by the tick task; safe to
    /// call directly (a test harness does exactly that). Never fails loudly;
    /// every failure is absorbed into a transition or a teardown.
    pub fn step(&self) {
        let mut inner = self.inner_locked();

        if inner.state == ScanState::Terminal {
            return;
        }

        // Entry preconditions: the subject must still be a live player.
        let snapshot = with_entity(&self.subject, |subject| {
            subject.is_player().then_some(SubjectSnapshot {
                position: subject.position,
                heading: subject.heading,
            })
        })
        .flatten();
        let Some(subject) = snapshot else {
            warn!(session = %self.id, "subject no longer eligible, cancelling scan");
            self.cancel_locked(&mut inner);
            return;
        };

        // Combat preempts every state except an already-interrupted or
        // finished session.
        if !matches!(inner.state, ScanState::InCombat | ScanState::Terminal) {
            let fighting = inner
                .agent
                .as_ref()
                .and_then(|agent| with_entity(agent, |entity| entity.in_combat))
                .unwrap_or(false);
            if fighting {
                info!(session = %self.id, from = %inner.state, "drone pulled into combat");
                inner.state = ScanState::InCombat;
            }
        }

        // A drone that vanished between ticks ends the encounter. Landing
        // and HeadToSubject run before the drone exists; a dead drone still
        // resolves until it is destroyed.
        if inner.state.expects_agent()
            && inner.agent.as_ref().and_then(EntityHandle::resolve).is_none()
        {
            error!(session = %self.id, state = %inner.state, "scan drone is missing");
            inner.state = ScanState::Terminal;
        }

        inner.time_left -= 1;

        match inner.state {
            ScanState::Landing => self.on_landing(&mut inner),
            ScanState::HeadToSubject => self.on_head_to_subject(&mut inner),
            ScanState::ClosingIn => self.on_closing_in(&mut inner, subject),
            ScanState::InitiateScan => self.on_initiate_scan(&mut inner),
            ScanState::ScanDelay => self.on_scan_delay(&mut inner, subject),
            ScanState::InCombat => self.on_in_combat(&mut inner),
            ScanState::Takeoff => self.on_takeoff(&mut inner),
            ScanState::TakingOff => self.on_taking_off(&mut inner),
            // Set by the vanish check above; the tail tears down.
            ScanState::Terminal => {}
        }

        if inner.state == ScanState::Terminal {
            self.cancel_locked(&mut inner);
        } else {
            self.ticker.reschedule(self.tick_delay());
        }
    }

    /// Tear the session down: destroy the drone if it still exists,
    /// deregister from the subject, and cancel the tick task. Always
    /// succeeds; idempotent and safe to call at any point, including
    /// concurrently with a step.
    pub fn cancel(&self) {
        let mut inner = self.inner_locked();
        self.cancel_locked(&mut inner);
    }

    fn cancel_locked(&self, inner: &mut SessionInner) {
        let span = info_span!("cancel_scan", session = %self.id);
        let _guard = span.enter();

        if let Some(agent) = inner.agent.take() {
            if let Some(world) = agent.world() {
                // Detach under the drone's lock before removing it from the
                // world; destroying an already-destroyed drone is a no-op.
                with_entity(&agent, |entity| entity.follow_target = None);
                world.destroy(agent.id());
            }
        }

        with_entity(&self.subject, |subject| {
            subject.drop_session_if(SessionKind::ContrabandScan, self);
        });

        self.ticker.cancel();

        if inner.state != ScanState::Terminal {
            info!(from = %inner.state, "scan session cancelled");
        }
        inner.state = ScanState::Terminal;
    }

    // ── State handlers ──────────────────────────────────────────────

    fn on_landing(&self, inner: &mut SessionInner) {
        self.collaborators
            .messaging
            .play_effect_at(&self.subject, "drone_delivery", inner.anchor);
        inner.time_left = self.config.landing_delay_ticks;
        inner.state = ScanState::HeadToSubject;
    }

    fn on_head_to_subject(&self, inner: &mut SessionInner) {
        if inner.time_left > 0 {
            return;
        }

        let Some(world) = self.subject.world() else {
            error!(session = %self.id, "world gone before the drone spawned");
            inner.state = ScanState::Terminal;
            return;
        };

        let agent = world.spawn(EntityKind::Drone, &self.config.drone_template, inner.anchor);
        let followed = with_entity_pair(&self.subject, &agent, |_, drone| {
            drone.follow_target = Some(self.subject.id());
        });

        if followed.is_some() {
            info!(session = %self.id, drone = %agent.id(), "scan drone spawned");
            inner.agent = Some(agent);
            inner.state = ScanState::ClosingIn;
            inner.time_left = self.config.approach_timeout_ticks;
        } else {
            error!(session = %self.id, "scan drone is missing");
            inner.state = ScanState::Terminal;
        }
    }

    fn on_closing_in(&self, inner: &mut SessionInner, subject: SubjectSnapshot) {
        if inner.time_left <= 0 {
            // The drone never reached the subject; give up and depart.
            inner.state = ScanState::Takeoff;
            return;
        }

        let drone_position = inner
            .agent
            .as_ref()
            .and_then(|agent| with_entity(agent, |entity| entity.position));
        match drone_position {
            Some(position) => {
                if subject.position.distance_to(&position) < self.config.proximity_threshold {
                    inner.state = ScanState::InitiateScan;
                }
            }
            None => {
                error!(session = %self.id, "scan drone is missing");
                inner.state = ScanState::Terminal;
            }
        }
    }

    fn on_initiate_scan(&self, inner: &mut SessionInner) {
        let messaging = &self.collaborators.messaging;
        messaging.notify(&self.subject, "dismount_warning");

        let dismounted = with_entity(&self.subject, |subject| {
            let was_mounted = subject.mounted;
            subject.mounted = false;
            was_mounted
        })
        .unwrap_or(false);
        if dismounted {
            messaging.notify(&self.subject, "dismount");
        }

        messaging.notify(&self.subject, "probe_scan");

        let Some(agent) = inner.agent.clone() else {
            error!(session = %self.id, "scan drone is missing");
            inner.state = ScanState::Terminal;
            return;
        };
        let followed = with_entity_pair(&self.subject, &agent, |_, drone| {
            drone.follow_target = Some(self.subject.id());
        });
        if followed.is_none() {
            error!(session = %self.id, "scan drone is missing");
            inner.state = ScanState::Terminal;
            return;
        }

        messaging.show_fly_text(&agent, "probe_scan_fly");
        inner.time_left = self.config.scan_ticks;
        inner.state = ScanState::ScanDelay;
    }

    fn on_scan_delay(&self, inner: &mut SessionInner, subject: SubjectSnapshot) {
        if inner.time_left > 0 {
            return;
        }

        // The evaluation and the transition out of ScanDelay share this arm,
        // so the outcome can never be evaluated twice for one scan.
        let contraband = self
            .subject
            .world()
            .and_then(|world| world.capability_service())
            .map_or(0, |capability| capability.evaluate_outcome(&self.subject));

        let messaging = &self.collaborators.messaging;
        if contraband > 0 {
            messaging.notify(&self.subject, "probe_scan_positive");
            inner.state = ScanState::Takeoff;
            inner.time_left = self.config.positive_grace_ticks;

            self.dispatch_reinforcements(inner, subject);

            if let Some(agent) = inner.agent.clone() {
                with_entity(&agent, |drone| {
                    drone.leashed = true;
                    drone.follow_target = None;
                });
                messaging.show_fly_text(&agent, "drone_support_fly");
            }
        } else {
            messaging.notify(&self.subject, "probe_scan_negative");
            inner.state = ScanState::Takeoff;
            inner.time_left = self.config.negative_grace_ticks;
        }
    }

    fn on_in_combat(&self, inner: &mut SessionInner) {
        let status = inner
            .agent
            .as_ref()
            .and_then(|agent| with_entity(agent, |entity| (entity.in_combat, entity.dead)));
        match status {
            Some((false, false)) => {
                inner.state = ScanState::Takeoff;
                inner.time_left = self.config.combat_recover_grace_ticks;
            }
            Some((_, true)) => {
                // The drone was destroyed; linger so the subject cannot
                // immediately trigger another scan.
                inner.state = ScanState::TakingOff;
                inner.time_left = self.config.destroyed_linger_ticks;
            }
            Some((true, false)) => {}
            None => {
                inner.state = ScanState::Terminal;
            }
        }
    }

    fn on_takeoff(&self, inner: &mut SessionInner) {
        if inner.time_left > 0 {
            return;
        }

        let agent = inner.agent.clone();
        let departing = agent
            .as_ref()
            .and_then(|agent| with_entity(agent, |drone| drone.posture = crate::models::Posture::Departing));
        if departing.is_some() {
            inner.state = ScanState::TakingOff;
            inner.time_left = self.config.departure_ticks;
        } else {
            inner.state = ScanState::Terminal;
        }
    }

    fn on_taking_off(&self, inner: &mut SessionInner) {
        if inner.time_left <= 0 {
            inner.state = ScanState::Terminal;
        }
    }

    fn dispatch_reinforcements(&self, inner: &SessionInner, subject: SubjectSnapshot) {
        let spawn_point = self.subject.world().and_then(|world| {
            world.spawn_points().find_free_spawn_point(
                subject.position,
                SpawnPointKind::Dropship,
                self.config.spawn_search_radius,
            )
        });

        // No free pad: drop at the original anchor, facing away from the
        // subject so the ramp opens toward them.
        let (position, heading) = spawn_point.map_or_else(
            || (inner.anchor, opposite_heading(subject.heading)),
            |point| (point.position, point.heading),
        );

        info!(session = %self.id, ?position, "dispatching containment team");
        ReinforcementsTask::new(
            self.subject.clone(),
            position,
            heading,
            spawn_point,
            Arc::clone(&self.collaborators.messaging),
            &self.config,
        )
        .schedule(Duration::from_millis(self.config.reinforcement_delay_ms));
    }

    // ── Plumbing ────────────────────────────────────────────────────

    fn tick_delay(&self) -> Duration {
        Duration::from_secs(self.config.tick_seconds)
    }

    fn inner_locked(&self) -> MutexGuard<'_, SessionInner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
