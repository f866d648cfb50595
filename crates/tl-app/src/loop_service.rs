//! Live control loop service.
//!
//! The service owns the plant while idle and hands it to a background loop
//! thread for the duration of a run. The thread is the only writer of the
//! plant and the controller; when the run stops, the plant comes back
//! through the thread's join handle and waits for the next run. Starting a
//! run always builds a new controller, so retuned gains begin with an empty
//! integral and derivative history while the tank keeps its level and
//! temperature.
//!
//! Each tick publishes an immutable [`PlantSnapshot`] into a latest-value
//! slot and, space permitting, onto the event queue. At most
//! [`EVENT_CAPACITY`] tick events wait in the queue; `Started` and `Stopped`
//! are never dropped.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender, TryRecvError, channel};
use std::sync::{Arc, RwLock};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tl_controls::PidController;
use tl_core::to_duration;
use tl_sim::{Plant, PlantSnapshot, PlantState, TickSchedule, tick};
use tracing::{debug, error, info, trace, warn};

use crate::config::SimConfig;
use crate::error::{AppError, AppResult};
use crate::params::RunParams;

/// Maximum number of unread tick events. Further ticks are dropped until
/// the reader catches up.
pub const EVENT_CAPACITY: usize = 256;

/// Notifications emitted by the loop thread, in run order.
#[derive(Debug, Clone, PartialEq)]
pub enum LoopEvent {
    Started {
        run: u64,
        params: RunParams,
        /// Plant state carried into the run.
        plant: PlantSnapshot,
    },
    Tick {
        run: u64,
        /// Wall time since the run started (seconds).
        elapsed_s: f64,
        snapshot: PlantSnapshot,
        /// Controller integral after this tick.
        accumulated_error: f64,
    },
    Stopped {
        run: u64,
        /// Ticks executed during the run.
        ticks: u64,
    },
}

/// Reading end of the loop's event queue.
pub struct LoopEvents {
    rx: Receiver<LoopEvent>,
    queued_ticks: Arc<AtomicUsize>,
}

impl LoopEvents {
    pub fn try_recv(&self) -> Result<LoopEvent, TryRecvError> {
        self.rx.try_recv().map(|event| self.taken(event))
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Result<LoopEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout).map(|event| self.taken(event))
    }

    /// Drain the events queued so far without blocking.
    pub fn try_iter(&self) -> impl Iterator<Item = LoopEvent> + '_ {
        std::iter::from_fn(|| self.try_recv().ok())
    }

    fn taken(&self, event: LoopEvent) -> LoopEvent {
        if matches!(event, LoopEvent::Tick { .. }) {
            self.queued_ticks.fetch_sub(1, Ordering::AcqRel);
        }
        event
    }
}

/// Writing end of the event queue, owned by the loop thread.
#[derive(Clone)]
struct EventSink {
    tx: Sender<LoopEvent>,
    queued_ticks: Arc<AtomicUsize>,
}

impl EventSink {
    /// Queue a lifecycle event. Only fails once the service is gone.
    fn lifecycle(&self, event: LoopEvent) {
        if self.tx.send(event).is_err() {
            trace!("event reader gone; dropping lifecycle event");
        }
    }

    /// Queue a tick event unless [`EVENT_CAPACITY`] ticks are already
    /// unread. Returns whether it was queued.
    fn tick(&self, event: LoopEvent) -> bool {
        if self.queued_ticks.fetch_add(1, Ordering::AcqRel) >= EVENT_CAPACITY {
            self.queued_ticks.fetch_sub(1, Ordering::AcqRel);
            return false;
        }
        if self.tx.send(event).is_err() {
            self.queued_ticks.fetch_sub(1, Ordering::AcqRel);
            return false;
        }
        true
    }
}

struct LoopWorker {
    run: u64,
    stop: Arc<AtomicBool>,
    handle: JoinHandle<Plant>,
}

struct LoopContext {
    run: u64,
    params: RunParams,
    period: Duration,
    stop: Arc<AtomicBool>,
    latest: Arc<RwLock<PlantSnapshot>>,
    events: EventSink,
}

pub struct LoopService {
    config: SimConfig,
    period: Duration,
    plant: Option<Plant>,
    worker: Option<LoopWorker>,
    latest: Arc<RwLock<PlantSnapshot>>,
    sink: EventSink,
    events: LoopEvents,
    runs: u64,
}

impl LoopService {
    /// Create an idle service with the plant at its configured initial
    /// state.
    pub fn new(config: SimConfig) -> AppResult<Self> {
        config.validate()?;
        let plant = config.build_plant(None)?;
        let period = to_duration(config.tick_period())?;
        let latest = Arc::new(RwLock::new(plant.snapshot()));
        let (tx, rx) = channel();
        let queued_ticks = Arc::new(AtomicUsize::new(0));
        Ok(Self {
            config,
            period,
            plant: Some(plant),
            worker: None,
            latest,
            sink: EventSink {
                tx,
                queued_ticks: Arc::clone(&queued_ticks),
            },
            events: LoopEvents { rx, queued_ticks },
            runs: 0,
        })
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    /// Identifier of the current or most recent run (0 before the first).
    pub fn current_run(&self) -> u64 {
        self.runs
    }

    /// Most recently published snapshot.
    pub fn latest(&self) -> PlantSnapshot {
        match self.latest.read() {
            Ok(slot) => *slot,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    /// Plant state while idle. `None` while a run owns the plant.
    pub fn plant_state(&self) -> Option<PlantState> {
        self.plant.as_ref().map(Plant::state)
    }

    pub fn events(&self) -> &LoopEvents {
        &self.events
    }

    /// Start (or restart) a run from operator-entered text.
    ///
    /// Malformed input leaves everything as it was, including any run
    /// already in progress.
    pub fn start_from_text(
        &mut self,
        setpoint: &str,
        kp: &str,
        ki: &str,
        kd: &str,
    ) -> AppResult<RunParams> {
        let params = RunParams::parse(setpoint, kp, ki, kd).inspect_err(|e| {
            warn!(error = %e, "run did not start");
        })?;
        self.start(params)?;
        Ok(params)
    }

    /// Start (or restart) a run with a fresh controller.
    ///
    /// A run already in progress is stopped and joined first, so only one
    /// loop ever drives the plant. If the loop thread cannot be spawned the
    /// moved plant is lost with it; the service falls back to a plant at the
    /// configured initial state and the run counter is left unchanged.
    pub fn start(&mut self, params: RunParams) -> AppResult<()> {
        params.validate().inspect_err(|e| {
            warn!(error = %e, "run did not start");
        })?;

        if let Err(e) = self.stop() {
            warn!(error = %e, "previous run ended abnormally; continuing with a fresh plant");
        }

        let controller = params.controller()?;
        let plant = self
            .plant
            .take()
            .ok_or_else(|| AppError::Worker("plant is not available".to_string()))?;

        let run = self.runs + 1;
        let stop = Arc::new(AtomicBool::new(false));
        let ctx = LoopContext {
            run,
            params,
            period: self.period,
            stop: Arc::clone(&stop),
            latest: Arc::clone(&self.latest),
            events: self.sink.clone(),
        };

        let level = plant.state().level;
        let spawned = thread::Builder::new()
            .name(format!("tankloop-run-{run}"))
            .spawn(move || run_loop(ctx, controller, plant));
        let handle = match spawned {
            Ok(handle) => handle,
            Err(e) => {
                error!(run, error = %e, "could not spawn control loop; plant reset to its initial state");
                self.plant = Some(self.config.build_plant(None)?);
                return Err(e.into());
            }
        };

        self.runs = run;
        self.worker = Some(LoopWorker { run, stop, handle });
        info!(
            run,
            setpoint = params.setpoint,
            kp = params.gains.kp,
            ki = params.gains.ki,
            kd = params.gains.kd,
            level,
            "control run started"
        );
        Ok(())
    }

    /// Request the running loop to stop and wait for it.
    ///
    /// The tick in flight completes first. Returns `Ok(false)` when no run
    /// was active.
    pub fn stop(&mut self) -> AppResult<bool> {
        let Some(worker) = self.worker.take() else {
            return Ok(false);
        };

        worker.stop.store(true, Ordering::Release);
        worker.handle.thread().unpark();
        match worker.handle.join() {
            Ok(plant) => {
                info!(run = worker.run, ticks = plant.ticks(), "control run stopped");
                self.plant = Some(plant);
                Ok(true)
            }
            Err(_) => {
                error!(run = worker.run, "control loop thread panicked");
                self.plant = Some(self.config.build_plant(None)?);
                Err(AppError::Worker(format!(
                    "run {} panicked; plant reset to its initial state",
                    worker.run
                )))
            }
        }
    }
}

impl Drop for LoopService {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            warn!(error = %e, "control loop did not shut down cleanly");
        }
    }
}

fn run_loop(ctx: LoopContext, mut controller: PidController, mut plant: Plant) -> Plant {
    let started = Instant::now();
    let mut schedule = TickSchedule::new(ctx.period, started);
    let mut ticks = 0u64;

    ctx.events.lifecycle(LoopEvent::Started {
        run: ctx.run,
        params: ctx.params,
        plant: plant.snapshot(),
    });

    while !ctx.stop.load(Ordering::Acquire) {
        let snapshot = tick(&mut controller, &mut plant);
        ticks += 1;

        match ctx.latest.write() {
            Ok(mut slot) => *slot = snapshot,
            Err(poisoned) => *poisoned.into_inner() = snapshot,
        }
        let event = LoopEvent::Tick {
            run: ctx.run,
            elapsed_s: started.elapsed().as_secs_f64(),
            snapshot,
            accumulated_error: controller.accumulated_error(),
        };
        if !ctx.events.tick(event) {
            trace!(run = ctx.run, "event queue full; dropping tick event");
        }

        let skipped = schedule.advance(Instant::now());
        if skipped > 0 {
            debug!(run = ctx.run, skipped, "tick overran its period");
        }
        wait_for_tick(&schedule, &ctx.stop);
    }

    ctx.events.lifecycle(LoopEvent::Stopped {
        run: ctx.run,
        ticks,
    });
    plant
}

/// Sleep until the next deadline or until a stop is requested.
fn wait_for_tick(schedule: &TickSchedule, stop: &AtomicBool) {
    loop {
        if stop.load(Ordering::Acquire) {
            return;
        }
        let remaining = schedule.time_until_tick(Instant::now());
        if remaining.is_zero() {
            return;
        }
        thread::park_timeout(remaining);
    }
}
