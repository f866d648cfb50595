//! Error types for simulation operations.

use thiserror::Error;

/// Errors encountered while configuring or running a simulation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Non-physical condition: {what}")]
    NonPhysical { what: &'static str },

    #[error("Controller error: {message}")]
    Controller { message: String },
}

pub type SimResult<T> = Result<T, SimError>;

impl From<tl_controls::ControlError> for SimError {
    fn from(e: tl_controls::ControlError) -> Self {
        SimError::Controller {
            message: e.to_string(),
        }
    }
}

impl From<tl_core::TlError> for SimError {
    fn from(e: tl_core::TlError) -> Self {
        match e {
            tl_core::TlError::NonFinite { what, .. } => SimError::NonPhysical { what },
            tl_core::TlError::Malformed { what, .. } | tl_core::TlError::InvalidArg { what } => {
                SimError::InvalidArg { what }
            }
        }
    }
}
