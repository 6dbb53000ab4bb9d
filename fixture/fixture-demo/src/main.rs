//! Buzz-wire guidance demo.
//!
//! Drives the fixture engine at a fixed rate with a scripted trainee moving
//! a ring along a synthetic wire, and logs every cycle.
//!
//! # Commands
//!
//! - `fixture-demo run` - Run the scripted task
//! - `fixture-demo config` - Print the default task configuration as TOML
//!
//! Log verbosity follows `RUST_LOG` (for example `RUST_LOG=debug` to see
//! every state transition and constraint toggle).

mod trajectory;

use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fixture_core::{
    BuzzWireSession, CycleReport, DEFAULT_RATE_HZ, FixedRateLoop, TaskCommand, ToolRole,
};
use fixture_types::TaskConfig;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::trajectory::{ScriptedTrainee, synthetic_wire};

/// Virtual-fixture guidance demo
#[derive(Parser)]
#[command(name = "fixture-demo")]
#[command(about = "Scripted buzz-wire run through the guidance engine", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the scripted task and log every cycle
    Run(RunArgs),

    /// Print the default task configuration as TOML
    Config,
}

#[derive(clap::Args)]
struct RunArgs {
    /// Task configuration file (TOML); defaults are used when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Cycle rate in Hz
    #[arg(long, default_value_t = DEFAULT_RATE_HZ)]
    rate: f64,

    /// Stop after this many cycles
    #[arg(long)]
    cycles: Option<u64>,

    /// Number of scripted repetitions
    #[arg(long, default_value_t = 1)]
    repetitions: u32,

    /// Drive a second tool alongside the first
    #[arg(long)]
    bimanual: bool,

    /// Override the ring radius
    #[arg(long)]
    ring_radius: Option<f64>,

    /// Send RepeatLastAcquisition after this many seconds
    #[arg(long)]
    repeat_last_after: Option<f64>,
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer())
        .init();
}

fn load_config(path: &Path) -> Result<TaskConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

fn log_cycle(report: &CycleReport) {
    let t = &report.telemetry;
    if let Some(event) = report.event {
        info!(?event, repetitions = t.repetition_count, "task event");
    }
    if let Some(params) = report.constraint_update {
        info!(active = params.active, "constraint update");
    }

    let primary = report.estimate(ToolRole::Primary);
    debug!(
        state = t.state_ordinal(),
        repetitions = t.repetition_count,
        elapsed = t.elapsed_seconds,
        error_1 = t.error_field_1,
        error_2 = t.error_field_2,
        engaged = primary.is_some_and(|e| e.status.is_engaged()),
        severity = report.feedback.tool(ToolRole::Primary).map_or(0.0, |f| f.severity),
        "cycle"
    );
}

fn run(args: RunArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => TaskConfig::default(),
    };
    if let Some(radius) = args.ring_radius {
        config.ring_radius = radius;
    }
    config.bimanual |= args.bimanual;

    let wire = synthetic_wire(&config.waypoints)?;
    info!(
        segments = wire.num_segments(),
        length = wire.arc_length(),
        "synthetic wire built"
    );

    let mut trainee = ScriptedTrainee::new(&config, args.repetitions);
    let mut session = BuzzWireSession::new(config, wire).context("invalid task configuration")?;

    let mut driver = FixedRateLoop::new(args.rate)?;
    if let Some(max) = args.cycles {
        driver = driver.with_max_cycles(max);
    }
    if let Some(secs) = args.repeat_last_after {
        let delay = Duration::try_from_secs_f64(secs).context("invalid --repeat-last-after")?;
        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            std::thread::sleep(delay);
            let _ = tx.send(TaskCommand::RepeatLastAcquisition);
        });
        driver = driver.with_commands(rx);
    }

    let mut last = None;
    let stats = driver.run(&mut session, &mut trainee, &mut |report: &CycleReport| {
        log_cycle(report);
        last = Some(report.telemetry.clone());
    })?;

    if let Some(t) = last {
        println!(
            "{}: state {} ({}), {} repetitions, {} cycles, {} overruns",
            t.task_name,
            t.task_state,
            t.state_ordinal(),
            t.repetition_count,
            stats.cycles,
            stats.overruns
        );
    }
    Ok(())
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => run(args),
        Commands::Config => {
            print!("{}", toml::to_string_pretty(&TaskConfig::default())?);
            Ok(())
        }
    }
}
