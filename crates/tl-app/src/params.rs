//! Validated parameters for a control run.

use serde::{Deserialize, Serialize};
use tl_controls::{PidController, PidGains};
use tl_core::{Clock, ensure_finite, parse_finite};

use crate::error::{AppError, AppResult};

/// Setpoint and gains for one control run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunParams {
    pub setpoint: f64,
    pub gains: PidGains,
}

impl RunParams {
    pub fn new(setpoint: f64, kp: f64, ki: f64, kd: f64) -> AppResult<Self> {
        let setpoint = ensure_finite(setpoint, "setpoint")?;
        let gains =
            PidGains::new(kp, ki, kd).map_err(|e| AppError::InvalidInput(e.to_string()))?;
        Ok(Self { setpoint, gains })
    }

    /// Parse operator-entered text. Fails on the first field that is not a
    /// finite number.
    pub fn parse(setpoint: &str, kp: &str, ki: &str, kd: &str) -> AppResult<Self> {
        Self::new(
            parse_finite(setpoint, "setpoint")?,
            parse_finite(kp, "kp")?,
            parse_finite(ki, "ki")?,
            parse_finite(kd, "kd")?,
        )
    }

    pub fn validate(&self) -> AppResult<()> {
        ensure_finite(self.setpoint, "setpoint")?;
        self.gains
            .validate()
            .map_err(|e| AppError::InvalidInput(e.to_string()))
    }

    /// Fresh controller timed by the wall clock.
    pub fn controller(&self) -> AppResult<PidController> {
        Ok(PidController::new(self.gains, self.setpoint)?)
    }

    /// Fresh controller timed by `clock`.
    pub fn controller_with_clock<C: Clock>(&self, clock: C) -> AppResult<PidController<C>> {
        Ok(PidController::with_clock(self.gains, self.setpoint, clock)?)
    }
}
