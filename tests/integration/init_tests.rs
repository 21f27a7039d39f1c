//! Session initialization: preconditions, idempotency, anchor fallback.

use std::sync::Arc;

use contraband_scan::models::{EntityKind, SessionKind, Vec3};
use contraband_scan::services::Collaborators;
use contraband_scan::session::scan_session::SCAN_COOLDOWN_MARKER;
use contraband_scan::session::{ScanSession, ScanState};
use contraband_scan::world::locks::with_entity;
use contraband_scan::world::World;
use contraband_scan::ScanError;

use super::test_helpers::{harness, step_n, test_config};

#[tokio::test]
async fn initialize_registers_cooldown_slot_and_timer() {
    let h = harness(0);
    h.session.initialize().expect("initialize");

    let (on_cooldown, registered) = with_entity(&h.subject, |subject| {
        (
            subject.is_on_cooldown(SCAN_COOLDOWN_MARKER),
            subject.active_session(SessionKind::ContrabandScan),
        )
    })
    .expect("live subject");

    assert!(on_cooldown, "cooldown marker applied at init");
    let registered = registered.expect("session registered on subject");
    assert!(Arc::ptr_eq(&registered, &h.session));
    assert!(h.session.ticker().is_scheduled());
    assert_eq!(h.session.state(), ScanState::Landing);
}

#[tokio::test]
async fn initialize_twice_does_not_double_register() {
    let h = harness(0);
    h.session.initialize().expect("first initialize");
    h.session.initialize().expect("second initialize");

    let registered = with_entity(&h.subject, |subject| {
        subject.active_session(SessionKind::ContrabandScan)
    })
    .expect("live subject")
    .expect("still registered");
    assert!(Arc::ptr_eq(&registered, &h.session));
    assert!(h.session.ticker().is_scheduled());

    // The session still steps normally afterward.
    step_n(&h.session, 2);
    assert_eq!(h.session.state(), ScanState::ClosingIn);
}

#[tokio::test]
async fn initialize_fails_without_capability_service() {
    let world = World::builder().build();
    let subject = world.spawn(EntityKind::Player, "player", Vec3::default());
    let session = ScanSession::new(subject, test_config(), Collaborators::default());

    let err = session.initialize().expect_err("must fail");
    assert!(matches!(err, ScanError::Precondition(_)), "got {err}");
    assert!(!session.ticker().is_scheduled());
}

#[tokio::test]
async fn initialize_fails_when_subject_is_gone() {
    let h = harness(0);
    h.world.destroy(h.subject.id());

    let err = h.session.initialize().expect_err("must fail");
    assert!(matches!(err, ScanError::Precondition(_)));
}

#[tokio::test]
async fn anchor_falls_back_to_subject_position_without_spatial_service() {
    let capability = super::test_helpers::FixedCapability::new(0);
    let world = World::builder().capability(capability).build();
    let subject = world.spawn(EntityKind::Player, "player", Vec3::new(7.0, 0.0, 7.0));
    let session = ScanSession::new(subject.clone(), test_config(), Collaborators::default());

    session.initialize().expect("initialize");
    step_n(&session, 2);
    assert_eq!(session.state(), ScanState::ClosingIn);

    let drone = session.agent().expect("drone spawned");
    let drone_position = with_entity(&drone, |entity| entity.position).expect("live drone");
    assert!((drone_position.x - 7.0).abs() < f32::EPSILON);
    assert!((drone_position.z - 7.0).abs() < f32::EPSILON);
}

#[tokio::test]
async fn drone_spawns_at_the_computed_anchor() {
    let h = harness(0);
    h.session.initialize().expect("initialize");
    step_n(&h.session, 2);

    let drone = h.session.agent().expect("drone spawned");
    let position = with_entity(&drone, |entity| entity.position).expect("live drone");
    // LineOfSightSpatial places the anchor at the midpoint of the 10..20
    // band, straight ahead of a subject facing heading 0.
    assert!((position.z - 15.0).abs() < 1e-4);

    let follows = with_entity(&drone, |entity| entity.follow_target).expect("live drone");
    assert_eq!(follows, Some(h.subject.id()));
}
