//! Tick sequence and headless simulation runner.

use crate::error::{SimError, SimResult};
use crate::plant::Plant;
use crate::snapshot::PlantSnapshot;
use tl_controls::PidController;
use tl_core::{Clock, ManualClock};
use tracing::debug;

/// Run one control tick: controller update on the current level, then the
/// plant's level and temperature updates.
pub fn tick<C: Clock>(controller: &mut PidController<C>, plant: &mut Plant) -> PlantSnapshot {
    let command = controller.compute(plant.state().level);
    plant.apply(command)
}

/// Options for headless runs.
#[derive(Clone, Debug)]
pub struct SimOptions {
    /// Simulated time between ticks (seconds)
    pub dt: f64,
    /// Number of ticks to run
    pub ticks: usize,
    /// Record every N-th tick (decimation)
    pub record_every: usize,
}

impl Default for SimOptions {
    fn default() -> Self {
        Self {
            dt: 0.5,
            ticks: 120,
            record_every: 1,
        }
    }
}

impl SimOptions {
    pub fn validate(&self) -> SimResult<()> {
        if !(self.dt > 0.0) || !self.dt.is_finite() {
            return Err(SimError::InvalidArg {
                what: "dt must be positive",
            });
        }
        if self.record_every == 0 {
            return Err(SimError::InvalidArg {
                what: "record_every must be positive",
            });
        }
        Ok(())
    }
}

/// Recorded series of a headless run.
#[derive(Clone, Debug, Default)]
pub struct SimRecord {
    /// Simulated time of each sample (seconds)
    pub t: Vec<f64>,
    /// Plant snapshot at each sample
    pub x: Vec<PlantSnapshot>,
}

impl SimRecord {
    pub fn len(&self) -> usize {
        self.t.len()
    }

    pub fn is_empty(&self) -> bool {
        self.t.is_empty()
    }

    pub fn last(&self) -> Option<(f64, &PlantSnapshot)> {
        self.t.last().copied().zip(self.x.last())
    }

    /// Iterate `(time, snapshot)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (f64, &PlantSnapshot)> {
        self.t.iter().copied().zip(self.x.iter())
    }
}

/// Run `opts.ticks` control ticks without sleeping.
///
/// The controller's manual clock is advanced by `opts.dt` before each tick,
/// so every update sees exactly that interval. The starting state is always
/// recorded, as is the final state.
pub fn run_sim(
    controller: &mut PidController<ManualClock>,
    plant: &mut Plant,
    opts: &SimOptions,
) -> SimResult<SimRecord> {
    opts.validate()?;

    let clock = controller.clock().clone();
    let mut record = SimRecord::default();
    record.t.push(clock.now_s());
    record.x.push(plant.snapshot());

    let mut step = 0;
    while step < opts.ticks {
        let t = clock.advance(opts.dt);
        let snapshot = tick(controller, plant);
        step += 1;

        if step % opts.record_every == 0 {
            record.t.push(t);
            record.x.push(snapshot);
        }
    }

    // Always record final state
    if step % opts.record_every != 0 {
        record.t.push(clock.now_s());
        record.x.push(plant.snapshot());
    }

    debug!(ticks = step, samples = record.len(), "headless run complete");
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::noise::NoNoise;
    use crate::plant::{PlantState, TankParams, ThermalParams};
    use tl_controls::PidGains;

    fn setup(level: f64) -> (PidController<ManualClock>, Plant) {
        let thermal = ThermalParams::default();
        let plant = Plant::new(
            TankParams::default(),
            thermal,
            PlantState::at_rest(level, 25.0, &thermal),
            Box::new(NoNoise),
        )
        .unwrap();
        let pid = PidController::with_clock(
            PidGains::new(2.0, 0.5, 0.1).unwrap(),
            50.0,
            ManualClock::new(0.0),
        )
        .unwrap();
        (pid, plant)
    }

    #[test]
    fn sim_options_defaults() {
        let opts = SimOptions::default();
        assert_eq!(opts.dt, 0.5);
        assert_eq!(opts.ticks, 120);
        assert_eq!(opts.record_every, 1);
    }

    #[test]
    fn sim_options_invalid() {
        let (mut pid, mut plant) = setup(30.0);
        let opts = SimOptions {
            dt: 0.0,
            ..SimOptions::default()
        };
        assert!(run_sim(&mut pid, &mut plant, &opts).is_err());
        let opts = SimOptions {
            record_every: 0,
            ..SimOptions::default()
        };
        assert!(run_sim(&mut pid, &mut plant, &opts).is_err());
        assert_eq!(plant.ticks(), 0);
    }

    #[test]
    fn first_tick_applies_worked_example_command() {
        let (mut pid, mut plant) = setup(30.0);
        let opts = SimOptions {
            dt: 1.0,
            ticks: 1,
            record_every: 1,
        };
        let record = run_sim(&mut pid, &mut plant, &opts).unwrap();
        assert_eq!(record.len(), 2);
        let (t, snap) = record.last().unwrap();
        assert_eq!(t, 1.0);
        assert!((snap.actuator_command - 52.0).abs() < 1e-9);
        // 30 + 0.52 * 2 - 0.5
        assert!((snap.level - 30.54).abs() < 1e-9);
    }

    #[test]
    fn decimation_keeps_final_sample() {
        let (mut pid, mut plant) = setup(30.0);
        let opts = SimOptions {
            dt: 0.5,
            ticks: 10,
            record_every: 4,
        };
        let record = run_sim(&mut pid, &mut plant, &opts).unwrap();
        // t0, tick 4, tick 8, final tick 10
        assert_eq!(record.len(), 4);
        assert_eq!(record.t, vec![0.0, 2.0, 4.0, 5.0]);
        assert_eq!(record.x.last().unwrap().tick, 10);
    }

    #[test]
    fn tick_feeds_level_to_controller() {
        let (mut pid, mut plant) = setup(30.0);
        pid.clock().advance(1.0);
        let snap = tick(&mut pid, &mut plant);
        assert_eq!(snap.tick, 1);
        assert_eq!(pid.previous_error(), 20.0);
    }
}
