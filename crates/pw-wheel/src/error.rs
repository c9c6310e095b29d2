//! Error types for spin resolution

use thiserror::Error;

/// Spin engine errors
#[derive(Error, Debug)]
pub enum SpinError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Spin {spin_id} is already in progress")]
    AlreadySpinning { spin_id: u64 },

    #[error("Animation for spin {spin_id} stalled after {elapsed_ms:.0} ms, force-completed")]
    AnimationStalled { spin_id: u64, elapsed_ms: f64 },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SpinError {
    /// True for errors that leave the controller state untouched
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            SpinError::InvalidInput(_) | SpinError::AlreadySpinning { .. }
        )
    }
}

/// Result type for spin operations
pub type SpinResult<T> = Result<T, SpinError>;
