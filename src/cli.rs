use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "cpustat")]
#[command(about = "Rolling terminal charts of system and per-process CPU usage")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Sampling interval
    #[arg(long, short = 'i', default_value = "1s", value_parser = parse_duration)]
    pub interval: Duration,

    /// Number of busiest processes to chart
    #[arg(long, short = 'n', default_value = "10")]
    pub top: usize,

    /// Samples drawn per terminal cell of chart width
    #[arg(long, default_value = "2")]
    pub points_per_cell: u16,

    /// Samples subtracted from the chart width for axis labels
    #[arg(long, default_value = "14")]
    pub reserved_points: u16,

    /// Ticks an untracked process keeps its history (0 keeps it forever)
    #[arg(long, default_value = "60")]
    pub reap_after: u64,

    /// Keep a process's colour while it stays in the ranking
    #[arg(long)]
    pub sticky_colors: bool,

    /// Write logs to this file (RUST_LOG sets the level)
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}

fn parse_duration(s: &str) -> Result<Duration, String> {
    if let Ok(d) = humantime::parse_duration(s) {
        return Ok(d);
    }

    // bare number as seconds
    if let Ok(secs) = s.parse::<u64>() {
        return Ok(Duration::from_secs(secs));
    }

    Err(format!(
        "Invalid duration '{}'. Examples: 500ms, 1s, 2s, 1",
        s
    ))
}

impl Cli {
    pub fn validate(&self) -> Result<(), String> {
        if self.interval < Duration::from_millis(10) || self.interval > Duration::from_secs(3600) {
            return Err(format!(
                "Interval must be between 10ms and 1h, got {}",
                humantime::format_duration(self.interval)
            ));
        }

        if self.top == 0 || self.top > 100 {
            return Err(format!("--top must be between 1 and 100, got {}", self.top));
        }

        if self.points_per_cell == 0 {
            return Err("--points-per-cell must be at least 1".to_string());
        }

        Ok(())
    }

    /// `None` when reaping is disabled.
    pub fn reap_grace(&self) -> Option<u64> {
        (self.reap_after > 0).then_some(self.reap_after)
    }
}
