//! Process simulation for tankloop.
//!
//! Provides:
//! - Tank level model (valve inflow, constant leak)
//! - Thermal model (level-banded target, first-order lag, sensor noise)
//! - Tick schedule for fixed-period loops
//! - The per-tick control sequence shared by live and headless runs
//! - Headless fixed-step runner producing a recorded series

pub mod error;
pub mod noise;
pub mod plant;
pub mod schedule;
pub mod sim;
pub mod snapshot;

pub use error::{SimError, SimResult};
pub use noise::{NoNoise, NoiseSource, UniformNoise};
pub use plant::{
    LEVEL_MAX, LEVEL_MIN, Plant, PlantState, TEMPERATURE_MAX, TEMPERATURE_MIN, TankParams,
    ThermalParams,
};
pub use schedule::TickSchedule;
pub use sim::{SimOptions, SimRecord, run_sim, tick};
pub use snapshot::PlantSnapshot;
