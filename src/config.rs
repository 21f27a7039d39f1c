//! Scan session configuration parsing and validation.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::{Result, ScanError};

/// Tunables for the scan encounter, parsed from `config.toml`.
///
/// Every field carries a default matching the live encounter script, so an
/// empty TOML document yields a fully usable configuration.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct ScanConfig {
    /// Delay between session ticks, in seconds.
    #[serde(default = "default_tick_seconds")]
    pub tick_seconds: u64,
    /// Ticks between the landing effect and the drone spawning.
    #[serde(default = "default_landing_delay_ticks")]
    pub landing_delay_ticks: i32,
    /// Ticks the drone gets to reach the subject before giving up.
    #[serde(default = "default_approach_timeout_ticks")]
    pub approach_timeout_ticks: i32,
    /// Distance at which the drone is close enough to start scanning.
    #[serde(default = "default_proximity_threshold")]
    pub proximity_threshold: f32,
    /// Ticks the scan itself takes to resolve.
    #[serde(default = "default_scan_ticks")]
    pub scan_ticks: i32,
    /// Departure grace after a positive scan (containment team inbound).
    #[serde(default = "default_positive_grace_ticks")]
    pub positive_grace_ticks: i32,
    /// Departure grace after a negative scan.
    #[serde(default = "default_negative_grace_ticks")]
    pub negative_grace_ticks: i32,
    /// Departure grace after the drone disengages from combat alive.
    #[serde(default = "default_combat_recover_grace_ticks")]
    pub combat_recover_grace_ticks: i32,
    /// Ticks the session lingers when the drone was destroyed in combat.
    #[serde(default = "default_destroyed_linger_ticks")]
    pub destroyed_linger_ticks: i32,
    /// Ticks the departure animation plays before the session ends.
    #[serde(default = "default_departure_ticks")]
    pub departure_ticks: i32,
    /// Minimum distance from the subject for the landing anchor.
    #[serde(default = "default_anchor_min_distance")]
    pub anchor_min_distance: f32,
    /// Maximum distance from the subject for the landing anchor.
    #[serde(default = "default_anchor_max_distance")]
    pub anchor_max_distance: f32,
    /// Required clearance around the landing anchor.
    #[serde(default = "default_anchor_clearance")]
    pub anchor_clearance: f32,
    /// Search radius for a free dropship spawn point near the subject.
    #[serde(default = "default_spawn_search_radius")]
    pub spawn_search_radius: f32,
    /// Cooldown (seconds) applied to the subject when a scan starts.
    #[serde(default = "default_scan_cooldown_seconds")]
    pub scan_cooldown_seconds: u64,
    /// Template identifier for the scan drone.
    #[serde(default = "default_drone_template")]
    pub drone_template: String,
    /// Template identifier for the reinforcement dropship.
    #[serde(default = "default_dropship_template")]
    pub dropship_template: String,
    /// Template identifier for reinforcement troopers.
    #[serde(default = "default_trooper_template")]
    pub trooper_template: String,
    /// Number of troopers the dropship delivers.
    #[serde(default = "default_reinforcement_count")]
    pub reinforcement_count: u32,
    /// Delay (milliseconds) before the reinforcement task runs.
    #[serde(default = "default_reinforcement_delay_ms")]
    pub reinforcement_delay_ms: u64,
}

fn default_tick_seconds() -> u64 {
    1
}

fn default_landing_delay_ticks() -> i32 {
    3
}

fn default_approach_timeout_ticks() -> i32 {
    30
}

fn default_proximity_threshold() -> f32 {
    32.0
}

fn default_scan_ticks() -> i32 {
    10
}

fn default_positive_grace_ticks() -> i32 {
    45
}

fn default_negative_grace_ticks() -> i32 {
    5
}

fn default_combat_recover_grace_ticks() -> i32 {
    5
}

fn default_destroyed_linger_ticks() -> i32 {
    60
}

fn default_departure_ticks() -> i32 {
    7
}

fn default_anchor_min_distance() -> f32 {
    30.0
}

fn default_anchor_max_distance() -> f32 {
    120.0
}

fn default_anchor_clearance() -> f32 {
    15.0
}

fn default_spawn_search_radius() -> f32 {
    128.0
}

fn default_scan_cooldown_seconds() -> u64 {
    1800
}

fn default_drone_template() -> String {
    "patrol_drone".into()
}

fn default_dropship_template() -> String {
    "containment_dropship".into()
}

fn default_trooper_template() -> String {
    "containment_trooper".into()
}

fn default_reinforcement_count() -> u32 {
    1
}

fn default_reinforcement_delay_ms() -> u64 {
    1000
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            tick_seconds: default_tick_seconds(),
            landing_delay_ticks: default_landing_delay_ticks(),
            approach_timeout_ticks: default_approach_timeout_ticks(),
            proximity_threshold: default_proximity_threshold(),
            scan_ticks: default_scan_ticks(),
            positive_grace_ticks: default_positive_grace_ticks(),
            negative_grace_ticks: default_negative_grace_ticks(),
            combat_recover_grace_ticks: default_combat_recover_grace_ticks(),
            destroyed_linger_ticks: default_destroyed_linger_ticks(),
            departure_ticks: default_departure_ticks(),
            anchor_min_distance: default_anchor_min_distance(),
            anchor_max_distance: default_anchor_max_distance(),
            anchor_clearance: default_anchor_clearance(),
            spawn_search_radius: default_spawn_search_radius(),
            scan_cooldown_seconds: default_scan_cooldown_seconds(),
            drone_template: default_drone_template(),
            dropship_template: default_dropship_template(),
            trooper_template: default_trooper_template(),
            reinforcement_count: default_reinforcement_count(),
            reinforcement_delay_ms: default_reinforcement_delay_ms(),
        }
    }
}

impl ScanConfig {
    /// Load and validate configuration from a TOML file path.
    ///
    /// # Errors
    ///
    /// Returns `ScanError::Config` if the file cannot be read or contains
    /// invalid TOML, or if validation fails.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|err| ScanError::Config(format!("failed to read config: {err}")))?;
        Self::from_toml_str(&raw)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns `ScanError::Config` if parsing or validation fails.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.tick_seconds == 0 {
            return Err(ScanError::Config("tick_seconds must be greater than zero".into()));
        }

        if self.proximity_threshold <= 0.0 {
            return Err(ScanError::Config(
                "proximity_threshold must be greater than zero".into(),
            ));
        }

        if self.anchor_min_distance > self.anchor_max_distance {
            return Err(ScanError::Config(
                "anchor_min_distance must not exceed anchor_max_distance".into(),
            ));
        }

        for (name, value) in [
            ("landing_delay_ticks", self.landing_delay_ticks),
            ("approach_timeout_ticks", self.approach_timeout_ticks),
            ("scan_ticks", self.scan_ticks),
            ("positive_grace_ticks", self.positive_grace_ticks),
            ("negative_grace_ticks", self.negative_grace_ticks),
            ("combat_recover_grace_ticks", self.combat_recover_grace_ticks),
            ("destroyed_linger_ticks", self.destroyed_linger_ticks),
            ("departure_ticks", self.departure_ticks),
        ] {
            if value <= 0 {
                return Err(ScanError::Config(format!("{name} must be greater than zero")));
            }
        }

        Ok(())
    }
}
