//! Contraband scan sessions for a multiplayer world server.
//!
//! A [`session::ScanSession`] binds a long-lived *subject* actor to a
//! transient scan *drone* that the session spawns, walks through a scripted
//! multi-phase encounter, and eventually destroys. The session is driven by
//! a re-arming one-shot timer task rather than a blocking loop: each firing
//! performs exactly one state-machine step and either re-arms the timer or
//! tears everything down.

#![forbid(unsafe_code)]

pub mod config;
pub mod errors;
pub mod models;
pub mod services;
pub mod session;
pub mod world;

pub use config::ScanConfig;
pub use errors::{Result, ScanError};
