//! End-to-end scan sequences: positive and negative outcomes.

use std::time::Duration;

use contraband_scan::models::{EntityKind, Vec3};
use contraband_scan::session::ScanState;
use contraband_scan::world::locks::with_entity;
use contraband_scan::world::spawn_points::SpawnPointKind;

use super::test_helpers::{advance_to_scan_delay, harness, harness_with, step_n, test_config};

#[tokio::test]
async fn positive_scan_runs_the_full_sequence() {
    let h = harness(2);
    h.session.initialize().expect("initialize");
    assert_eq!(h.session.state(), ScanState::Landing);

    h.session.step();
    assert_eq!(h.session.state(), ScanState::HeadToSubject);
    assert_eq!(h.messaging.effect_count("drone_delivery"), 1);

    h.session.step();
    assert_eq!(h.session.state(), ScanState::ClosingIn);
    assert!(h.session.agent().is_some());

    h.session.step();
    assert_eq!(h.session.state(), ScanState::InitiateScan);

    h.session.step();
    assert_eq!(h.session.state(), ScanState::ScanDelay);
    assert_eq!(h.messaging.notice_count("probe_scan"), 1);
    assert_eq!(h.messaging.fly_text_count("probe_scan_fly"), 1);

    // Scan resolving: two ticks of countdown, then the evaluation.
    step_n(&h.session, 2);
    assert_eq!(h.session.state(), ScanState::Takeoff);
    assert_eq!(h.session.time_left(), 45, "positive outcome grace");
    assert_eq!(h.messaging.notice_count("probe_scan_positive"), 1);

    // The drone disengages and guards the scene.
    let drone = h.session.agent().expect("drone alive");
    let leashed = with_entity(&drone, |entity| entity.leashed).expect("live drone");
    assert!(leashed);

    // The auxiliary task delivers the containment team.
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(h.world.count_of(EntityKind::Dropship), 1);
    assert_eq!(h.world.count_of(EntityKind::Trooper), 1);
    assert_eq!(h.messaging.notice_count("containment_team_dispatched"), 1);

    let trooper = h.world.first_of(EntityKind::Trooper).expect("trooper");
    let follows = with_entity(&trooper, |entity| entity.follow_target).expect("live trooper");
    assert_eq!(follows, Some(h.subject.id()));

    // Departure: grace runs down, then the drone folds up and leaves.
    step_n(&h.session, 45);
    assert_eq!(h.session.state(), ScanState::TakingOff);
    assert_eq!(h.session.time_left(), 7);
    let drone = h.session.agent().expect("drone still present");
    let posture = with_entity(&drone, |entity| entity.posture).expect("live drone");
    assert_eq!(posture, contraband_scan::models::Posture::Departing);

    step_n(&h.session, 7);
    assert_eq!(h.session.state(), ScanState::Terminal);

    // Teardown: drone destroyed, session deregistered, timer dead.
    assert_eq!(h.world.count_of(EntityKind::Drone), 0);
    assert!(h.session.agent().is_none());
    assert!(!h.session.ticker().is_scheduled());
    let slot = with_entity(&h.subject, |subject| {
        subject.active_session(contraband_scan::models::SessionKind::ContrabandScan)
    })
    .expect("live subject");
    assert!(slot.is_none());

    // The containment team outlives the session.
    assert_eq!(h.world.count_of(EntityKind::Dropship), 1);
}

#[tokio::test]
async fn negative_scan_departs_quickly_without_reinforcements() {
    let h = harness(0);
    h.session.initialize().expect("initialize");

    advance_to_scan_delay(&h);
    step_n(&h.session, 2);

    assert_eq!(h.session.state(), ScanState::Takeoff);
    assert_eq!(h.session.time_left(), 5, "negative outcome grace");
    assert_eq!(h.messaging.notice_count("probe_scan_negative"), 1);
    assert_eq!(h.messaging.notice_count("probe_scan_positive"), 0);

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(h.world.count_of(EntityKind::Dropship), 0);
    assert_eq!(h.world.count_of(EntityKind::Trooper), 0);
    assert_eq!(h.messaging.notice_count("containment_team_dispatched"), 0);

    step_n(&h.session, 5);
    assert_eq!(h.session.state(), ScanState::TakingOff);
    step_n(&h.session, 7);
    assert_eq!(h.session.state(), ScanState::Terminal);
    assert_eq!(h.world.count_of(EntityKind::Drone), 0);
}

#[tokio::test]
async fn scan_outcome_is_evaluated_exactly_once() {
    let h = harness(1);
    h.session.initialize().expect("initialize");

    advance_to_scan_delay(&h);
    // Ticks keep firing well past the countdown reaching zero.
    step_n(&h.session, 10);

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(h.messaging.notice_count("probe_scan_positive"), 1);
    assert_eq!(h.messaging.notice_count("containment_team_dispatched"), 1);
    assert_eq!(h.world.count_of(EntityKind::Dropship), 1);
    assert_eq!(h.world.count_of(EntityKind::Trooper), 1);
}

#[tokio::test]
async fn mounted_subject_is_dismounted_at_scan_start() {
    let h = harness(0);
    h.session.initialize().expect("initialize");
    with_entity(&h.subject, |subject| subject.mounted = true).expect("live subject");

    advance_to_scan_delay(&h);

    let mounted = with_entity(&h.subject, |subject| subject.mounted).expect("live subject");
    assert!(!mounted);
    assert_eq!(h.messaging.notice_count("dismount_warning"), 1);
    assert_eq!(h.messaging.notice_count("dismount"), 1);
}

#[tokio::test]
async fn unmounted_subject_gets_no_dismount_notice() {
    let h = harness(0);
    h.session.initialize().expect("initialize");

    advance_to_scan_delay(&h);

    assert_eq!(h.messaging.notice_count("dismount_warning"), 1);
    assert_eq!(h.messaging.notice_count("dismount"), 0);
}

#[tokio::test]
async fn drone_that_never_arrives_departs_on_timeout() {
    // Anchor far outside the proximity threshold and a short approach
    // budget: the drone can never reach the subject.
    let config = contraband_scan::ScanConfig {
        anchor_min_distance: 200.0,
        anchor_max_distance: 300.0,
        approach_timeout_ticks: 3,
        ..test_config()
    };
    let h = harness_with(0, true, config);
    h.session.initialize().expect("initialize");

    step_n(&h.session, 2);
    assert_eq!(h.session.state(), ScanState::ClosingIn);

    step_n(&h.session, 3);
    assert_eq!(h.session.state(), ScanState::Takeoff);

    // The takeoff countdown was already exhausted by the failed approach,
    // so the next tick starts the departure.
    h.session.step();
    assert_eq!(h.session.state(), ScanState::TakingOff);
}

#[tokio::test]
async fn delivered_pad_returns_to_the_pool() {
    let h = harness(1);
    h.session.initialize().expect("initialize");
    advance_to_scan_delay(&h);
    step_n(&h.session, 2);
    assert_eq!(h.session.state(), ScanState::Takeoff);

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(h.world.count_of(EntityKind::Dropship), 1);

    // The pad claimed for the delivery is free again for the next scan.
    let pad = h.world.spawn_points().find_free_spawn_point(
        Vec3::default(),
        SpawnPointKind::Dropship,
        128.0,
    );
    assert!(pad.is_some());
}

#[tokio::test]
async fn reinforcements_fall_back_to_the_anchor_without_a_free_pad() {
    let h = harness_with(3, false, test_config());
    h.session.initialize().expect("initialize");

    advance_to_scan_delay(&h);
    step_n(&h.session, 2);
    assert_eq!(h.session.state(), ScanState::Takeoff);

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(h.world.count_of(EntityKind::Dropship), 1);

    // Dropped at the anchor (0, 0, 15), facing back toward the subject.
    let dropship = h.world.first_of(EntityKind::Dropship).expect("dropship");
    let (position, heading) =
        with_entity(&dropship, |entity| (entity.position, entity.heading)).expect("live dropship");
    assert!((position.z - 15.0).abs() < 1e-4);
    assert!((heading - std::f32::consts::PI).abs() < 1e-4);
}
