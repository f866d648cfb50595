//! PID control law for tankloop.
//!
//! A [`PidController`] turns a process measurement into an actuator command
//! bounded to `[0, 100]` percent. The controller measures the interval
//! between updates from a [`tl_core::Clock`], so the same law runs against
//! wall-clock time in live loops and against a manual clock in headless
//! simulations and tests.
//!
//! # Example
//!
//! ```
//! use tl_controls::{PidController, PidGains};
//! use tl_core::ManualClock;
//!
//! let clock = ManualClock::new(0.0);
//! let gains = PidGains::new(2.0, 0.5, 0.1).unwrap();
//! let mut pid = PidController::with_clock(gains, 50.0, clock.clone()).unwrap();
//!
//! clock.advance(1.0);
//! let command = pid.compute(30.0);
//! assert!((command - 52.0).abs() < 1e-9);
//! ```

pub mod controller;
pub mod error;

pub use controller::{ControlTerms, OUTPUT_MAX, OUTPUT_MIN, PidController, PidGains};
pub use error::{ControlError, ControlResult};
