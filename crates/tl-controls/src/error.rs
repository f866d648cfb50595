//! Error types for control system operations.

use thiserror::Error;

/// Result type for control system operations.
pub type ControlResult<T> = Result<T, ControlError>;

/// Errors that can occur while configuring a controller.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ControlError {
    /// Invalid argument provided to a control function.
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    /// A gain or setpoint was NaN or infinite.
    #[error("Non-finite {what}: {value}")]
    NonFinite { what: &'static str, value: f64 },
}

impl From<tl_core::TlError> for ControlError {
    fn from(e: tl_core::TlError) -> Self {
        match e {
            tl_core::TlError::NonFinite { what, value } => ControlError::NonFinite { what, value },
            tl_core::TlError::Malformed { what, .. } | tl_core::TlError::InvalidArg { what } => {
                ControlError::InvalidArg { what }
            }
        }
    }
}
