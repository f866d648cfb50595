//! Error types for the tl-app service layer.

use std::path::PathBuf;

use crate::config::ConfigError;

/// Application error type that wraps errors from the backend crates and
/// provides a unified error interface for front ends.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Failed to read config file: {path}")]
    ConfigFileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Controller error: {0}")]
    Controller(String),

    #[error("Simulation error: {0}")]
    Simulation(String),

    #[error("Control loop worker failed: {0}")]
    Worker(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for tl-app operations.
pub type AppResult<T> = Result<T, AppError>;

impl From<tl_core::TlError> for AppError {
    fn from(err: tl_core::TlError) -> Self {
        AppError::InvalidInput(err.to_string())
    }
}

impl From<tl_controls::ControlError> for AppError {
    fn from(err: tl_controls::ControlError) -> Self {
        AppError::Controller(err.to_string())
    }
}

impl From<tl_sim::SimError> for AppError {
    fn from(err: tl_sim::SimError) -> Self {
        AppError::Simulation(err.to_string())
    }
}
