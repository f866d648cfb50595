//! Immutable per-tick view of the plant handed to presentation code.

use crate::plant::PlantState;
use serde::{Deserialize, Serialize};
use tl_core::{Ratio, Temperature, degc, percent};

/// Process values published after a tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlantSnapshot {
    /// Ticks applied to the plant when the snapshot was taken.
    pub tick: u64,
    /// Tank fill (PV), percent.
    pub level: f64,
    /// Valve opening (MV), percent.
    pub actuator_command: f64,
    /// Measured temperature, °C.
    pub temperature: f64,
    /// Thermal set-point for the current level band, °C.
    pub temperature_target: f64,
}

impl PlantSnapshot {
    pub fn new(tick: u64, state: &PlantState) -> Self {
        Self {
            tick,
            level: state.level,
            actuator_command: state.actuator_command,
            temperature: state.temperature,
            temperature_target: state.temperature_target,
        }
    }

    pub fn level_ratio(&self) -> Ratio {
        percent(self.level)
    }

    pub fn valve_ratio(&self) -> Ratio {
        percent(self.actuator_command)
    }

    pub fn temperature_quantity(&self) -> Temperature {
        degc(self.temperature)
    }
}
