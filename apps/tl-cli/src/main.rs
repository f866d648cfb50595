use clap::{Parser, Subcommand, ValueEnum};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};
use tl_app::{
    AppResult, LoopEvent, LoopService, RunParams, SimConfig, SimRequest, load_config,
    sim_service,
};
use tl_core::{as_degc, as_percent};
use tl_sim::PlantSnapshot;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tl-cli")]
#[command(about = "tankloop CLI - PID tank level and temperature simulator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the live control loop and print every tick
    Run {
        #[command(flatten)]
        tuning: TuningArgs,
        /// Stop after this many seconds (default: until Enter or end of input)
        #[arg(long)]
        duration: Option<f64>,
        /// Path to a YAML or JSON config file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Tune the live loop from stdin (start/stop/status/quit)
    Interactive {
        /// Path to a YAML or JSON config file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Run headless on a simulated clock and export the series
    Simulate {
        #[command(flatten)]
        tuning: TuningArgs,
        /// Number of ticks to simulate
        #[arg(long, default_value_t = 120)]
        ticks: usize,
        /// Record every N-th tick
        #[arg(long, default_value_t = 1)]
        record_every: usize,
        /// Noise seed (overrides the config)
        #[arg(long)]
        seed: Option<u64>,
        /// Output format
        #[arg(long, value_enum, default_value_t = SeriesFormat::Csv)]
        format: SeriesFormat,
        /// Output file path (optional, defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Path to a YAML or JSON config file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Validate a config file
    ValidateConfig {
        /// Path to the config file
        config_path: PathBuf,
    },
}

#[derive(clap::Args)]
struct TuningArgs {
    /// Level setpoint, percent (default from config)
    #[arg(long)]
    setpoint: Option<f64>,
    /// Proportional gain (default from config)
    #[arg(long)]
    kp: Option<f64>,
    /// Integral gain (default from config)
    #[arg(long)]
    ki: Option<f64>,
    /// Derivative gain (default from config)
    #[arg(long)]
    kd: Option<f64>,
}

impl TuningArgs {
    fn resolve(&self, config: &SimConfig) -> AppResult<RunParams> {
        let d = &config.controller;
        RunParams::new(
            self.setpoint.unwrap_or(d.setpoint),
            self.kp.unwrap_or(d.kp),
            self.ki.unwrap_or(d.ki),
            self.kd.unwrap_or(d.kd),
        )
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum SeriesFormat {
    Csv,
    Json,
}

fn main() -> AppResult<()> {
    // Logs go to stderr so snapshots and exported series stay clean on stdout.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            tuning,
            duration,
            config,
        } => cmd_run(&tuning, duration, config.as_deref()),
        Commands::Interactive { config } => cmd_interactive(config.as_deref()),
        Commands::Simulate {
            tuning,
            ticks,
            record_every,
            seed,
            format,
            output,
            config,
        } => cmd_simulate(
            &tuning,
            ticks,
            record_every,
            seed,
            format,
            output.as_deref(),
            config.as_deref(),
        ),
        Commands::ValidateConfig { config_path } => cmd_validate_config(&config_path),
    }
}

fn resolve_config(path: Option<&Path>) -> AppResult<SimConfig> {
    match path {
        Some(path) => load_config(path),
        None => Ok(SimConfig::default()),
    }
}

fn cmd_run(tuning: &TuningArgs, duration: Option<f64>, config: Option<&Path>) -> AppResult<()> {
    let config = resolve_config(config)?;
    let params = tuning.resolve(&config)?;
    let mut service = LoopService::new(config)?;

    let deadline = duration
        .and_then(|secs| Duration::try_from_secs_f64(secs.max(0.0)).ok())
        .and_then(|span| Instant::now().checked_add(span));
    let quit = Arc::new(AtomicBool::new(false));
    if deadline.is_none() {
        let quit = Arc::clone(&quit);
        thread::spawn(move || {
            let mut line = String::new();
            let _ = io::stdin().lock().read_line(&mut line);
            quit.store(true, Ordering::Release);
        });
        println!("Press Enter to stop.");
    }

    service.start(params)?;
    println!(
        "Running: SP={} Kp={} Ki={} Kd={} (tick {:?})",
        params.setpoint,
        params.gains.kp,
        params.gains.ki,
        params.gains.kd,
        service.period()
    );

    loop {
        if quit.load(Ordering::Acquire) || deadline.is_some_and(|d| Instant::now() >= d) {
            tracing::debug!("stop requested");
            break;
        }
        if let Ok(event) = service.events().recv_timeout(Duration::from_millis(50)) {
            print_event(&event);
        }
    }

    service.stop()?;
    for event in service.events().try_iter() {
        print_event(&event);
    }
    Ok(())
}

fn cmd_interactive(config: Option<&Path>) -> AppResult<()> {
    let config = resolve_config(config)?;
    let mut service = LoopService::new(config)?;
    print_help();

    let stdin = io::stdin();
    let mut input = String::new();
    loop {
        print!("> ");
        let _ = io::stdout().flush();
        input.clear();
        if stdin.lock().read_line(&mut input)? == 0 {
            break;
        }
        // Keep the event queue from filling while the operator types.
        let _ = service.events().try_iter().count();

        let words: Vec<&str> = input.split_whitespace().collect();
        match words.as_slice() {
            [] => {}
            ["start", sp, kp, ki, kd] => match service.start_from_text(sp, kp, ki, kd) {
                Ok(params) => println!(
                    "✓ Run {} started: SP={} Kp={} Ki={} Kd={}",
                    service.current_run(),
                    params.setpoint,
                    params.gains.kp,
                    params.gains.ki,
                    params.gains.kd
                ),
                Err(e) => println!("✗ Did not start: {e}"),
            },
            ["start", ..] => println!("usage: start <setpoint> <kp> <ki> <kd>"),
            ["stop"] => {
                if service.stop()? {
                    println!("✓ Stopped");
                } else {
                    println!("Not running");
                }
            }
            ["status"] => {
                let state = if service.is_running() { "running" } else { "idle" };
                println!("[{state}] {}", render_snapshot(&service.latest()));
            }
            ["help"] => print_help(),
            ["quit"] | ["exit"] => break,
            _ => println!("Unknown command. Type 'help'."),
        }
    }

    service.stop()?;
    Ok(())
}

fn cmd_simulate(
    tuning: &TuningArgs,
    ticks: usize,
    record_every: usize,
    seed: Option<u64>,
    format: SeriesFormat,
    output: Option<&Path>,
    config: Option<&Path>,
) -> AppResult<()> {
    let config = resolve_config(config)?;
    let request = SimRequest {
        params: tuning.resolve(&config)?,
        ticks,
        record_every,
        seed,
    };
    tracing::debug!(ticks, record_every, ?seed, "starting headless run");
    let record = sim_service::simulate(&config, &request)?;

    let mut buf = Vec::new();
    match format {
        SeriesFormat::Csv => sim_service::write_csv(&record, &mut buf)?,
        SeriesFormat::Json => sim_service::write_json(&record, &mut buf)?,
    }

    // Write to file or stdout
    if let Some(path) = output {
        std::fs::write(path, buf)?;
        println!("✓ Exported {} samples to {}", record.len(), path.display());
    } else {
        io::stdout().write_all(&buf)?;
    }
    Ok(())
}

fn cmd_validate_config(config_path: &Path) -> AppResult<()> {
    println!("Validating config: {}", config_path.display());
    let config = load_config(config_path)?;
    println!(
        "✓ Config is valid (tick {} s, setpoint {}, Kp {}, Ki {}, Kd {})",
        config.tick_period_s,
        config.controller.setpoint,
        config.controller.kp,
        config.controller.ki,
        config.controller.kd
    );
    Ok(())
}

fn print_help() {
    println!("Commands:");
    println!("  start <setpoint> <kp> <ki> <kd>   start or restart the loop");
    println!("  stop                              stop the loop");
    println!("  status                            show the latest process values");
    println!("  quit                              stop and exit");
}

fn print_event(event: &LoopEvent) {
    match event {
        LoopEvent::Started { run, plant, .. } => {
            println!("-- run {run} started at level {:.2} %", plant.level)
        }
        LoopEvent::Tick {
            elapsed_s,
            snapshot,
            ..
        } => println!("{:>7.2}s  {}", elapsed_s, render_snapshot(snapshot)),
        LoopEvent::Stopped { run, ticks } => println!("-- run {run} stopped after {ticks} ticks"),
    }
}

fn render_snapshot(snap: &PlantSnapshot) -> String {
    let width = 20usize;
    let fill = snap.level_ratio().value;
    let filled = ((fill * width as f64).round() as usize).min(width);
    let bar = format!(
        "{}{}",
        "#".repeat(filled),
        "-".repeat(width.saturating_sub(filled))
    );
    format!(
        "PV {:>6.2} % [{}]  MV {:>6.2} %  T {:>6.2} °C (target {:.0})",
        as_percent(snap.level_ratio()),
        bar,
        as_percent(snap.valve_ratio()),
        as_degc(snap.temperature_quantity()),
        snap.temperature_target
    )
}
