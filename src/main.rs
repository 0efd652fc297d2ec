use anyhow::Context;
use clap::Parser;
use cpustat::app::{App, spawn_collector};
use cpustat::chart::{ClockResolution, Engine, EngineConfig, SampleInterval, ViewportGeometry};
use cpustat::cli::{Cli, Command};
use cpustat::error::exit_code;
use cpustat::pump::{Pump, completion_channel};
use cpustat::render::TerminalBoundary;
use cpustat::sampler::{ProcSampler, clock_resolution};
use std::fs::File;
use std::path::Path;
use std::process::ExitCode;
use std::sync::{Mutex, mpsc};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::from(exit_code::SUCCESS as u8),
        Err(e) => {
            eprintln!("Error: {e:#}");
            if let Some(err) = e.downcast_ref::<cpustat::Error>() {
                ExitCode::from(err.exit_code() as u8)
            } else {
                ExitCode::from(exit_code::GENERAL_ERROR as u8)
            }
        }
    }
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    cli.validate()
        .map_err(cpustat::Error::InvalidArgument)
        .context("Invalid arguments")?;

    if let Some(Command::Completions { shell }) = cli.command {
        use clap::CommandFactory;
        let mut cmd = Cli::command();
        clap_complete::generate(shell, &mut cmd, "cpustat", &mut std::io::stdout());
        return Ok(());
    }

    if let Some(path) = &cli.log_file {
        init_logging(path)?;
    }

    run_dashboard(&cli)
}

/// The dashboard owns the screen, so logs only go to a file.
fn init_logging(path: &Path) -> anyhow::Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create log file {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    tracing::info!("cpustat v{} starting", env!("CARGO_PKG_VERSION"));
    Ok(())
}

fn run_dashboard(cli: &Cli) -> anyhow::Result<()> {
    let clock = ClockResolution::new(clock_resolution())?;
    let interval = SampleInterval::new(cli.interval)?;
    tracing::info!(
        clock = clock.ticks_per_sec(),
        interval_ms = interval.as_millis_f64(),
        top = cli.top,
        "configured"
    );

    let engine = Engine::new(EngineConfig {
        clock,
        interval,
        geometry: ViewportGeometry {
            points_per_cell: cli.points_per_cell,
            reserved_points: cli.reserved_points,
        },
        reap_after: cli.reap_grace(),
        sticky_colors: cli.sticky_colors,
    });

    let boundary = TerminalBoundary::new().context("Failed to set up terminal")?;
    let (done_tx, done_rx) = completion_channel();
    let pump = Pump::new(engine, boundary, done_tx);

    let (tx, rx) = mpsc::channel();
    let collector = spawn_collector(ProcSampler::new(cli.top), interval.duration(), tx)
        .context("Failed to start collector")?;

    // dropping the app restores the terminal before anything is printed
    App::new(pump, rx).run();

    match done_rx.wait() {
        Some(completion) if completion.is_fatal() => {
            return Err(cpustat::Error::Fatal(completion.reason()).into());
        }
        Some(completion) => eprintln!("{}", completion.reason()),
        None => tracing::warn!("session ended without a completion"),
    }

    // the collector exits on its next send once the receiver is gone
    drop(collector);
    Ok(())
}
