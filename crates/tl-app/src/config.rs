//! Simulation configuration file format and validation.
//!
//! Every field has a default, so an empty document is a valid config that
//! reproduces the classic tank: 0.5 s ticks, inflow gain 2, leak 0.5, a
//! 25/70 °C thermal band split at level 50.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tl_core::{Time, s, to_duration};
use tl_sim::{
    LEVEL_MAX, LEVEL_MIN, NoiseSource, Plant, PlantState, TEMPERATURE_MAX, TEMPERATURE_MIN,
    TankParams, ThermalParams, UniformNoise,
};

use crate::error::{AppError, AppResult};
use crate::params::RunParams;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SimConfig {
    /// Wall-clock period of the control loop.
    pub tick_period_s: f64,
    pub tank: TankParams,
    pub thermal: ThermalParams,
    pub initial: InitialStateDef,
    pub noise: NoiseDef,
    pub controller: ControllerDefaults,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            tick_period_s: 0.5,
            tank: TankParams::default(),
            thermal: ThermalParams::default(),
            initial: InitialStateDef::default(),
            noise: NoiseDef::default(),
            controller: ControllerDefaults::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct InitialStateDef {
    pub level: f64,
    pub temperature: f64,
}

impl Default for InitialStateDef {
    fn default() -> Self {
        Self {
            level: 0.0,
            temperature: 25.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NoiseDef {
    /// Fixed seed for reproducible sensor noise. Entropy-seeded when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

/// Setpoint and gains offered before the operator edits anything.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ControllerDefaults {
    pub setpoint: f64,
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
}

impl Default for ControllerDefaults {
    fn default() -> Self {
        Self {
            setpoint: 50.0,
            kp: 2.0,
            ki: 0.5,
            kd: 0.1,
        }
    }
}

impl SimConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.tick_period_s > 0.0) || !self.tick_period_s.is_finite() {
            return Err(ConfigError::invalid(
                "tick_period_s",
                format!("must be a positive number, got {}", self.tick_period_s),
            ));
        }
        to_duration(self.tick_period())
            .map_err(|e| ConfigError::invalid("tick_period_s", e.to_string()))?;
        self.tank
            .validate()
            .map_err(|e| ConfigError::invalid("tank", e.to_string()))?;
        self.thermal
            .validate()
            .map_err(|e| ConfigError::invalid("thermal", e.to_string()))?;
        if !(LEVEL_MIN..=LEVEL_MAX).contains(&self.initial.level) {
            return Err(ConfigError::invalid(
                "initial.level",
                format!("must be within [{LEVEL_MIN}, {LEVEL_MAX}], got {}", self.initial.level),
            ));
        }
        if !(TEMPERATURE_MIN..=TEMPERATURE_MAX).contains(&self.initial.temperature) {
            return Err(ConfigError::invalid(
                "initial.temperature",
                format!(
                    "must be within [{TEMPERATURE_MIN}, {TEMPERATURE_MAX}], got {}",
                    self.initial.temperature
                ),
            ));
        }
        self.default_params()
            .map_err(|e| ConfigError::invalid("controller", e.to_string()))?;
        Ok(())
    }

    pub fn tick_period(&self) -> Time {
        s(self.tick_period_s)
    }

    /// Controller defaults as validated run parameters.
    pub fn default_params(&self) -> AppResult<RunParams> {
        let c = &self.controller;
        RunParams::new(c.setpoint, c.kp, c.ki, c.kd)
    }

    /// Sensor noise source, seeded from `seed` if given, else from the
    /// config seed, else from entropy.
    pub fn noise_source(&self, seed: Option<u64>) -> Box<dyn NoiseSource> {
        match seed.or(self.noise.seed) {
            Some(seed) => Box::new(UniformNoise::seeded(seed)),
            None => Box::new(UniformNoise::from_entropy()),
        }
    }

    /// Plant at its configured initial state.
    pub fn build_plant(&self, seed: Option<u64>) -> AppResult<Plant> {
        let initial =
            PlantState::at_rest(self.initial.level, self.initial.temperature, &self.thermal);
        let plant = Plant::new(self.tank, self.thermal, initial, self.noise_source(seed))?;
        Ok(plant)
    }
}

/// Parse and validate a YAML config document.
pub fn parse_config(text: &str) -> Result<SimConfig, ConfigError> {
    let config: SimConfig = serde_yaml::from_str(text)?;
    config.validate()?;
    Ok(config)
}

/// Load a config file. `.json` files are read as JSON, anything else as
/// YAML.
pub fn load_config(path: &Path) -> AppResult<SimConfig> {
    let content = std::fs::read_to_string(path).map_err(|source| AppError::ConfigFileRead {
        path: path.to_path_buf(),
        source,
    })?;
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let config = if is_json {
        let config: SimConfig = serde_json::from_str(&content).map_err(ConfigError::from)?;
        config.validate()?;
        config
    } else {
        parse_config(&content)?
    };
    tracing::debug!(path = %path.display(), "loaded config");
    Ok(config)
}
