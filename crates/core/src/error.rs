//! Centralized error types for the seatsync workspace.

use thiserror::Error;

/// Top-level error enum. Variants map to subsystems.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SyncError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Roster error: {0}")]
    Roster(String),

    #[error("Actuator error: {0}")]
    Actuator(String),

    #[error("Notify error: {0}")]
    Notify(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type SyncResult<T> = Result<T, SyncError>;
