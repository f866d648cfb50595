//! Tank and thermal process model.
//!
//! One call to [`Plant::apply`] is one tick of the process:
//!
//! 1. Level: the valve adds `command/100 * inflow_gain`, the leak always
//!    removes `leak_rate`, and the result is clamped to `[0, 100]`.
//! 2. Temperature: the target is `high_target` when the level is strictly
//!    above `level_threshold` and `low_target` otherwise. The temperature
//!    lags toward that target by `lag`, picks up sensor noise, and is
//!    clamped to `[10, 100]`.

use crate::error::{SimError, SimResult};
use crate::noise::NoiseSource;
use crate::snapshot::PlantSnapshot;
use serde::{Deserialize, Serialize};
use std::fmt;
use tl_controls::{OUTPUT_MAX, OUTPUT_MIN};
use tl_core::{ensure_finite, saturate};
use tracing::trace;

pub const LEVEL_MIN: f64 = 0.0;
pub const LEVEL_MAX: f64 = 100.0;
pub const TEMPERATURE_MIN: f64 = 10.0;
pub const TEMPERATURE_MAX: f64 = 100.0;

/// Tank level dynamics, in level-percent per tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TankParams {
    /// Level gained per tick with the valve fully open.
    pub inflow_gain: f64,
    /// Level lost per tick regardless of the valve.
    pub leak_rate: f64,
}

impl Default for TankParams {
    fn default() -> Self {
        Self {
            inflow_gain: 2.0,
            leak_rate: 0.5,
        }
    }
}

impl TankParams {
    pub fn validate(&self) -> SimResult<()> {
        ensure_finite(self.inflow_gain, "inflow_gain")?;
        ensure_finite(self.leak_rate, "leak_rate")?;
        if self.inflow_gain < 0.0 {
            return Err(SimError::InvalidArg {
                what: "inflow_gain must be non-negative",
            });
        }
        if self.leak_rate < 0.0 {
            return Err(SimError::InvalidArg {
                what: "leak_rate must be non-negative",
            });
        }
        Ok(())
    }

    /// Level after one tick with the valve at `command` percent.
    pub fn next_level(&self, level: f64, command: f64) -> f64 {
        let mut next = level;
        if command > 0.0 {
            next += (command / 100.0) * self.inflow_gain;
        }
        next -= self.leak_rate;
        saturate(next, LEVEL_MIN, LEVEL_MAX)
    }
}

/// Level-banded thermal model with sensor lag and noise.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThermalParams {
    /// Levels strictly above this select `high_target`.
    pub level_threshold: f64,
    pub high_target: f64,
    pub low_target: f64,
    /// Fraction of the remaining gap closed per tick, in `(0, 1]`.
    pub lag: f64,
    /// Half-width of the uniform sensor noise band.
    pub noise_amplitude: f64,
}

impl Default for ThermalParams {
    fn default() -> Self {
        Self {
            level_threshold: 50.0,
            high_target: 70.0,
            low_target: 25.0,
            lag: 0.1,
            noise_amplitude: 0.5,
        }
    }
}

impl ThermalParams {
    pub fn validate(&self) -> SimResult<()> {
        ensure_finite(self.level_threshold, "level_threshold")?;
        ensure_finite(self.high_target, "high_target")?;
        ensure_finite(self.low_target, "low_target")?;
        ensure_finite(self.lag, "lag")?;
        ensure_finite(self.noise_amplitude, "noise_amplitude")?;
        if !(self.lag > 0.0 && self.lag <= 1.0) {
            return Err(SimError::InvalidArg {
                what: "lag must be in (0, 1]",
            });
        }
        if self.noise_amplitude < 0.0 {
            return Err(SimError::InvalidArg {
                what: "noise_amplitude must be non-negative",
            });
        }
        Ok(())
    }

    /// Thermal set-point for the given level.
    pub fn target_for(&self, level: f64) -> f64 {
        if level > self.level_threshold {
            self.high_target
        } else {
            self.low_target
        }
    }

    /// Temperature after one tick of lag toward `target` plus `noise`.
    pub fn next_temperature(&self, temperature: f64, target: f64, noise: f64) -> f64 {
        let lagged = temperature + (target - temperature) * self.lag;
        saturate(lagged + noise, TEMPERATURE_MIN, TEMPERATURE_MAX)
    }
}

/// Process variables owned by the plant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlantState {
    /// Tank fill, percent.
    pub level: f64,
    /// Valve opening, percent.
    pub actuator_command: f64,
    /// Measured temperature, °C.
    pub temperature: f64,
    /// Thermal set-point implied by the current level band, °C.
    pub temperature_target: f64,
}

impl PlantState {
    /// Resting state at the given level and temperature, valve closed.
    /// Out-of-range inputs are clamped.
    pub fn at_rest(level: f64, temperature: f64, thermal: &ThermalParams) -> Self {
        let level = saturate(level, LEVEL_MIN, LEVEL_MAX);
        Self {
            level,
            actuator_command: 0.0,
            temperature: saturate(temperature, TEMPERATURE_MIN, TEMPERATURE_MAX),
            temperature_target: thermal.target_for(level),
        }
    }
}

/// Simulated tank with its thermal sensor.
pub struct Plant {
    tank: TankParams,
    thermal: ThermalParams,
    noise: Box<dyn NoiseSource>,
    state: PlantState,
    ticks: u64,
}

impl fmt::Debug for Plant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Plant")
            .field("tank", &self.tank)
            .field("thermal", &self.thermal)
            .field("state", &self.state)
            .field("ticks", &self.ticks)
            .finish_non_exhaustive()
    }
}

impl Plant {
    pub fn new(
        tank: TankParams,
        thermal: ThermalParams,
        initial: PlantState,
        noise: Box<dyn NoiseSource>,
    ) -> SimResult<Self> {
        tank.validate()?;
        thermal.validate()?;
        ensure_finite(initial.level, "initial level")?;
        ensure_finite(initial.temperature, "initial temperature")?;
        let state = PlantState::at_rest(initial.level, initial.temperature, &thermal);
        Ok(Self {
            tank,
            thermal,
            noise,
            state,
            ticks: 0,
        })
    }

    pub fn state(&self) -> PlantState {
        self.state
    }

    /// Number of ticks applied since construction.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn tank(&self) -> &TankParams {
        &self.tank
    }

    pub fn thermal(&self) -> &ThermalParams {
        &self.thermal
    }

    pub fn snapshot(&self) -> PlantSnapshot {
        PlantSnapshot::new(self.ticks, &self.state)
    }

    /// Advance the process one tick with the valve at `command` percent.
    pub fn apply(&mut self, command: f64) -> PlantSnapshot {
        let command = saturate(command, OUTPUT_MIN, OUTPUT_MAX);
        self.state.actuator_command = command;
        self.update_level();
        self.update_temperature();
        self.ticks += 1;
        trace!(
            tick = self.ticks,
            level = self.state.level,
            command,
            temperature = self.state.temperature,
            "plant tick"
        );
        self.snapshot()
    }

    fn update_level(&mut self) {
        self.state.level = self
            .tank
            .next_level(self.state.level, self.state.actuator_command);
    }

    fn update_temperature(&mut self) {
        let target = self.thermal.target_for(self.state.level);
        let noise = self.noise.sample(self.thermal.noise_amplitude);
        self.state.temperature_target = target;
        self.state.temperature = self
            .thermal
            .next_temperature(self.state.temperature, target, noise);
    }
}
