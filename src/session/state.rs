//! Scan encounter phases.

use serde::Serialize;

/// Phase of a scan encounter, in transition order.
///
/// `Terminal` is absorbing: once reached, the agent has been destroyed, the
/// tick task cancelled, and the session deregistered from the subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanState {
    /// Landing effect plays at the anchor position.
    Landing,
    /// Waiting for the drone delivery; the drone spawns when the countdown
    /// expires.
    HeadToSubject,
    /// Drone approaching the subject.
    ClosingIn,
    /// One-shot scripted interruption: dismount and scan messaging.
    InitiateScan,
    /// Scan resolving; outcome evaluated when the countdown expires.
    ScanDelay,
    /// Drone pulled into combat; waiting for the fight to resolve.
    InCombat,
    /// Countdown before the departure animation.
    Takeoff,
    /// Departure in progress.
    TakingOff,
    /// Session over.
    Terminal,
}

impl ScanState {
    /// Whether the drone is expected to exist in this phase.
    #[must_use]
    pub fn expects_agent(self) -> bool {
        !matches!(self, Self::Landing | Self::HeadToSubject | Self::Terminal)
    }
}

impl std::fmt::Display for ScanState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Landing => "landing",
            Self::HeadToSubject => "head_to_subject",
            Self::ClosingIn => "closing_in",
            Self::InitiateScan => "initiate_scan",
            Self::ScanDelay => "scan_delay",
            Self::InCombat => "in_combat",
            Self::Takeoff => "takeoff",
            Self::TakingOff => "taking_off",
            Self::Terminal => "terminal",
        };
        f.write_str(name)
    }
}
