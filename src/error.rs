//! Engine error kinds

use thiserror::Error;

/// Errors surfaced by the engine and its configuration layer.
///
/// Out-of-range cell access is not represented here: it is a programming
/// defect and panics inside [`Grid`](crate::grid::Grid).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Invalid session configuration, fatal at construction
    #[error("invalid configuration: {reason}")]
    Config { reason: String },
    /// Input symbol outside the closed event set
    #[error("unrecognized input event `{0}`")]
    InvalidEvent(String),
    /// Settings file could not be read, parsed or written
    #[error("settings: {0}")]
    Settings(String),
}

impl EngineError {
    pub fn config(reason: impl Into<String>) -> Self {
        EngineError::Config {
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
