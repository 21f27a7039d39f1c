//! Unit tests for the scan state enum.

use contraband_scan::session::ScanState;

#[test]
fn agent_expectation_per_phase() {
    assert!(!ScanState::Landing.expects_agent());
    assert!(!ScanState::HeadToSubject.expects_agent());
    assert!(!ScanState::Terminal.expects_agent());

    assert!(ScanState::ClosingIn.expects_agent());
    assert!(ScanState::InitiateScan.expects_agent());
    assert!(ScanState::ScanDelay.expects_agent());
    assert!(ScanState::InCombat.expects_agent());
    assert!(ScanState::Takeoff.expects_agent());
    assert!(ScanState::TakingOff.expects_agent());
}

#[test]
fn display_names_are_stable() {
    assert_eq!(ScanState::Landing.to_string(), "landing");
    assert_eq!(ScanState::HeadToSubject.to_string(), "head_to_subject");
    assert_eq!(ScanState::ScanDelay.to_string(), "scan_delay");
    assert_eq!(ScanState::Terminal.to_string(), "terminal");
}
