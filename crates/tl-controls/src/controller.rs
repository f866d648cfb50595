//! Positional PID controller.
//!
//! The law is the textbook parallel form evaluated once per call:
//!
//! ```text
//! e  = sp - pv
//! P  = kp * e
//! I  = ki * sum(e * dt)
//! D  = kd * (e - e_prev) / dt
//! u  = clamp(P + I + D, 0, 100)
//! ```
//!
//! The integral accumulator is never clamped; only the output saturates.
//! Calls that observe no elapsed time are no-ops returning a zero command.

use crate::error::{ControlError, ControlResult};
use serde::{Deserialize, Serialize};
use tl_core::{Clock, WallClock, ensure_finite, saturate};
use tracing::trace;

/// Lower bound of the actuator command (valve fully closed).
pub const OUTPUT_MIN: f64 = 0.0;
/// Upper bound of the actuator command (valve fully open).
pub const OUTPUT_MAX: f64 = 100.0;

/// Proportional, integral and derivative gains.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PidGains {
    /// Proportional gain.
    pub kp: f64,
    /// Integral gain (per second).
    pub ki: f64,
    /// Derivative gain (seconds).
    pub kd: f64,
}

impl PidGains {
    /// Create a gain set. All gains must be finite.
    pub fn new(kp: f64, ki: f64, kd: f64) -> ControlResult<Self> {
        let gains = Self { kp, ki, kd };
        gains.validate()?;
        Ok(gains)
    }

    /// Check that every gain is finite.
    pub fn validate(&self) -> ControlResult<()> {
        ensure_finite(self.kp, "kp")?;
        ensure_finite(self.ki, "ki")?;
        ensure_finite(self.kd, "kd")?;
        Ok(())
    }
}

/// Breakdown of a single controller update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlTerms {
    /// Setpoint minus measurement.
    pub error: f64,
    /// Interval since the previous update (seconds).
    pub dt: f64,
    /// Proportional contribution.
    pub p: f64,
    /// Integral contribution.
    pub i: f64,
    /// Derivative contribution.
    pub d: f64,
    /// Unclamped sum of the three terms.
    pub raw: f64,
    /// Command after clamping to `[OUTPUT_MIN, OUTPUT_MAX]`.
    pub output: f64,
}

impl ControlTerms {
    /// Whether the output limits cut the raw command.
    pub fn saturated(&self) -> bool {
        self.raw != self.output
    }
}

/// PID controller bound to a setpoint and a time source.
///
/// A controller instance is one control run: gains and setpoint are fixed at
/// construction, and the integral/derivative history starts from zero.
/// Retuning means building a new controller.
#[derive(Debug, Clone)]
pub struct PidController<C: Clock = WallClock> {
    gains: PidGains,
    setpoint: f64,
    accumulated_error: f64,
    previous_error: f64,
    previous_time: f64,
    clock: C,
}

impl PidController<WallClock> {
    /// Create a controller timed by the wall clock.
    pub fn new(gains: PidGains, setpoint: f64) -> ControlResult<Self> {
        Self::with_clock(gains, setpoint, WallClock::new())
    }
}

impl<C: Clock> PidController<C> {
    /// Create a controller timed by `clock`.
    ///
    /// The first update measures its interval from the current reading of
    /// `clock`.
    pub fn with_clock(gains: PidGains, setpoint: f64, clock: C) -> ControlResult<Self> {
        gains.validate()?;
        let setpoint = ensure_finite(setpoint, "setpoint").map_err(ControlError::from)?;
        let previous_time = clock.now_s();
        Ok(Self {
            gains,
            setpoint,
            accumulated_error: 0.0,
            previous_error: 0.0,
            previous_time,
            clock,
        })
    }

    /// Compute the actuator command for `measurement` at the clock's current
    /// time.
    pub fn compute(&mut self, measurement: f64) -> f64 {
        let now = self.clock.now_s();
        self.compute_at(measurement, now)
    }

    /// Compute the actuator command for `measurement` observed at `now_s`.
    pub fn compute_at(&mut self, measurement: f64, now_s: f64) -> f64 {
        self.update(measurement, now_s).map_or(0.0, |terms| terms.output)
    }

    /// Run one update and return the term breakdown.
    ///
    /// Returns `None` without touching any state when no time has elapsed
    /// since the previous update.
    pub fn update(&mut self, measurement: f64, now_s: f64) -> Option<ControlTerms> {
        let dt = now_s - self.previous_time;
        if !(dt > 0.0) {
            trace!(dt, "pid update skipped: no elapsed time");
            return None;
        }

        let error = self.setpoint - measurement;
        let p = self.gains.kp * error;

        self.accumulated_error += error * dt;
        let i = self.gains.ki * self.accumulated_error;

        let derivative = (error - self.previous_error) / dt;
        let d = self.gains.kd * derivative;

        let raw = p + i + d;
        let output = saturate(raw, OUTPUT_MIN, OUTPUT_MAX);

        self.previous_error = error;
        self.previous_time = now_s;

        trace!(error, dt, p, i, d, output, "pid update");
        Some(ControlTerms {
            error,
            dt,
            p,
            i,
            d,
            raw,
            output,
        })
    }

    pub fn gains(&self) -> PidGains {
        self.gains
    }

    pub fn setpoint(&self) -> f64 {
        self.setpoint
    }

    /// Running integral of error over time.
    pub fn accumulated_error(&self) -> f64 {
        self.accumulated_error
    }

    pub fn previous_error(&self) -> f64 {
        self.previous_error
    }

    /// Timestamp of the last effective update (or construction).
    pub fn previous_time(&self) -> f64 {
        self.previous_time
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tl_core::ManualClock;

    fn controller(kp: f64, ki: f64, kd: f64, sp: f64) -> (PidController<ManualClock>, ManualClock) {
        let clock = ManualClock::new(0.0);
        let pid = PidController::with_clock(PidGains::new(kp, ki, kd).unwrap(), sp, clock.clone())
            .unwrap();
        (pid, clock)
    }

    #[test]
    fn first_update_matches_worked_example() {
        let (mut pid, clock) = controller(2.0, 0.5, 0.1, 50.0);
        clock.advance(1.0);

        let terms = pid.update(30.0, clock.now_s()).unwrap();
        assert_eq!(terms.error, 20.0);
        assert_eq!(terms.p, 40.0);
        assert_eq!(pid.accumulated_error(), 20.0);
        assert_eq!(terms.i, 10.0);
        assert!((terms.d - 2.0).abs() < 1e-12);
        assert!((terms.output - 52.0).abs() < 1e-12);
        assert!(!terms.saturated());
    }

    #[test]
    fn zero_interval_is_a_no_op() {
        let (mut pid, clock) = controller(2.0, 0.5, 0.1, 50.0);
        clock.advance(1.0);
        let first = pid.compute(30.0);
        assert!(first > 0.0);

        let integral = pid.accumulated_error();
        let prev_error = pid.previous_error();
        let prev_time = pid.previous_time();

        let second = pid.compute(10.0);
        assert_eq!(second, 0.0);
        assert_eq!(pid.accumulated_error(), integral);
        assert_eq!(pid.previous_error(), prev_error);
        assert_eq!(pid.previous_time(), prev_time);
    }

    #[test]
    fn backwards_time_is_a_no_op() {
        let (mut pid, _clock) = controller(1.0, 1.0, 1.0, 10.0);
        assert!(pid.update(0.0, -1.0).is_none());
        assert_eq!(pid.accumulated_error(), 0.0);
    }

    #[test]
    fn proportional_only_is_exact() {
        let (mut pid, clock) = controller(3.0, 0.0, 0.0, 50.0);
        clock.advance(0.5);
        assert_eq!(pid.compute(40.0), 30.0);
        clock.advance(0.5);
        assert_eq!(pid.compute(60.0), 0.0);
        clock.advance(0.5);
        assert_eq!(pid.compute(0.0), 100.0);
    }

    #[test]
    fn integral_grows_under_constant_positive_error() {
        let (mut pid, clock) = controller(0.0, 1.0, 0.0, 10.0);
        let mut last = pid.accumulated_error();
        for _ in 0..20 {
            clock.advance(0.5);
            pid.compute(5.0);
            assert!(pid.accumulated_error() > last);
            last = pid.accumulated_error();
        }
        assert!((last - 50.0).abs() < 1e-9);
    }

    #[test]
    fn integral_is_not_clamped_when_output_saturates() {
        let (mut pid, clock) = controller(0.0, 10.0, 0.0, 100.0);
        for _ in 0..10 {
            clock.advance(1.0);
            assert_eq!(pid.compute(0.0), OUTPUT_MAX);
        }
        assert_eq!(pid.accumulated_error(), 1000.0);
    }

    #[test]
    fn derivative_uses_previous_error() {
        let (mut pid, clock) = controller(0.0, 0.0, 1.0, 50.0);
        clock.advance(1.0);
        pid.compute(40.0); // e = 10, d = 10
        clock.advance(2.0);
        let terms = pid.update(44.0, clock.now_s()).unwrap(); // e = 6
        assert!((terms.d - (6.0 - 10.0) / 2.0).abs() < 1e-12);
        assert_eq!(terms.output, 0.0);
        assert!(terms.saturated());
    }

    #[test]
    fn non_finite_configuration_is_rejected() {
        assert!(PidGains::new(f64::NAN, 0.0, 0.0).is_err());
        assert!(PidGains::new(1.0, f64::INFINITY, 0.0).is_err());
        let gains = PidGains::new(1.0, 0.0, 0.0).unwrap();
        assert!(matches!(
            PidController::with_clock(gains, f64::NAN, ManualClock::new(0.0)),
            Err(ControlError::NonFinite {
                what: "setpoint",
                ..
            })
        ));
    }

    #[test]
    fn wall_clock_controller_builds() {
        let pid = PidController::new(PidGains::new(1.0, 0.1, 0.0).unwrap(), 50.0).unwrap();
        assert_eq!(pid.setpoint(), 50.0);
        assert_eq!(pid.accumulated_error(), 0.0);
        assert_eq!(pid.previous_error(), 0.0);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;
    use tl_core::ManualClock;

    proptest! {
        #[test]
        fn output_always_within_limits(
            kp in -100.0_f64..100.0,
            ki in -10.0_f64..10.0,
            kd in -10.0_f64..10.0,
            sp in 0.0_f64..100.0,
            pvs in prop::collection::vec(0.0_f64..100.0, 1..20),
            dt in 0.001_f64..2.0,
        ) {
            let clock = ManualClock::new(0.0);
            let mut pid = PidController::with_clock(PidGains { kp, ki, kd }, sp, clock.clone()).unwrap();
            for pv in pvs {
                clock.advance(dt);
                let u = pid.compute(pv);
                prop_assert!((OUTPUT_MIN..=OUTPUT_MAX).contains(&u));
            }
        }

        #[test]
        fn proportional_only_matches_closed_form(
            kp in -10.0_f64..10.0,
            sp in 0.0_f64..100.0,
            pv in 0.0_f64..100.0,
            dt in 0.001_f64..2.0,
        ) {
            let clock = ManualClock::new(0.0);
            let mut pid = PidController::with_clock(PidGains { kp, ki: 0.0, kd: 0.0 }, sp, clock.clone()).unwrap();
            clock.advance(dt);
            let expected = (kp * (sp - pv)).clamp(OUTPUT_MIN, OUTPUT_MAX);
            prop_assert_eq!(pid.compute(pv), expected);
        }
    }
}
