//! Headless runs and series export.

use std::io::Write;

use serde::Serialize;
use tl_core::ManualClock;
use tl_sim::{PlantSnapshot, SimOptions, SimRecord, run_sim};
use tracing::info;

use crate::config::SimConfig;
use crate::error::AppResult;
use crate::params::RunParams;

/// Request for a headless run on a simulated clock.
#[derive(Debug, Clone)]
pub struct SimRequest {
    pub params: RunParams,
    pub ticks: usize,
    pub record_every: usize,
    /// Overrides the config noise seed.
    pub seed: Option<u64>,
}

/// Run the configured plant under `request.params` for `request.ticks`
/// ticks spaced one tick period apart in simulated time.
pub fn simulate(config: &SimConfig, request: &SimRequest) -> AppResult<SimRecord> {
    config.validate()?;
    request.params.validate()?;

    let mut plant = config.build_plant(request.seed)?;
    let mut controller = request
        .params
        .controller_with_clock(ManualClock::new(0.0))?;
    let opts = SimOptions {
        dt: config.tick_period_s,
        ticks: request.ticks,
        record_every: request.record_every,
    };
    let record = run_sim(&mut controller, &mut plant, &opts)?;
    info!(
        ticks = request.ticks,
        samples = record.len(),
        final_level = plant.state().level,
        "headless run finished"
    );
    Ok(record)
}

#[derive(Serialize)]
struct SeriesRow<'a> {
    time_s: f64,
    #[serde(flatten)]
    snapshot: &'a PlantSnapshot,
}

/// Write the series as CSV with a header row.
pub fn write_csv<W: Write>(record: &SimRecord, out: &mut W) -> AppResult<()> {
    writeln!(
        out,
        "time_s,tick,level,actuator_command,temperature,temperature_target"
    )?;
    for (t, snap) in record.iter() {
        writeln!(
            out,
            "{},{},{},{},{},{}",
            t,
            snap.tick,
            snap.level,
            snap.actuator_command,
            snap.temperature,
            snap.temperature_target
        )?;
    }
    Ok(())
}

/// Write the series as a pretty-printed JSON array of rows.
pub fn write_json<W: Write>(record: &SimRecord, out: &mut W) -> AppResult<()> {
    let rows: Vec<SeriesRow<'_>> = record
        .iter()
        .map(|(time_s, snapshot)| SeriesRow { time_s, snapshot })
        .collect();
    serde_json::to_writer_pretty(&mut *out, &rows)?;
    writeln!(out)?;
    Ok(())
}
