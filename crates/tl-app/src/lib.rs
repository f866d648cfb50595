//! Shared application service layer for tankloop.
//!
//! This crate provides the boundary between the control core and whatever
//! presents it: configuration loading, run parameter validation, the live
//! control loop service, and headless runs.

pub mod config;
pub mod error;
pub mod loop_service;
pub mod params;
pub mod sim_service;

// Re-export key types for convenience
pub use config::{
    ConfigError, ControllerDefaults, InitialStateDef, NoiseDef, SimConfig, load_config,
    parse_config,
};
pub use error::{AppError, AppResult};
pub use loop_service::{EVENT_CAPACITY, LoopEvent, LoopEvents, LoopService};
pub use params::RunParams;
pub use sim_service::{SimRequest, simulate};
