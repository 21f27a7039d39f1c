//! Error types shared across the crate.

use std::fmt::{Display, Formatter};

/// Shared crate result type.
pub type Result<T> = std::result::Result<T, ScanError>;

/// Error enumeration covering the session's failure modes.
///
/// Only `initialize` surfaces errors to callers; `step` and `cancel` absorb
/// every failure locally and report through logging.
#[derive(Debug)]
pub enum ScanError {
    /// Configuration parsing or validation failure.
    Config(String),
    /// Session precondition not met (subject gone, capability missing).
    Precondition(String),
}

impl Display for ScanError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Precondition(msg) => write!(f, "precondition: {msg}"),
        }
    }
}

impl std::error::Error for ScanError {}

impl From<toml::de::Error> for ScanError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(format!("invalid config: {err}"))
    }
}
