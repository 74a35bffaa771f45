//! Command-line argument parsing for Contrail.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// Contrail command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug)]
#[command(name = "contrail", about = "Remote aircraft visual tracking replay")]
pub struct CliArgs {
    /// Render ticks per second.
    #[arg(long)]
    pub frame_rate: Option<u32>,

    /// Replay length in seconds.
    #[arg(long)]
    pub duration: Option<u32>,

    /// Interval between scripted position reports in milliseconds.
    #[arg(long)]
    pub report_interval: Option<u64>,

    /// Minimum time between terrain probes in milliseconds.
    #[arg(long)]
    pub probe_interval: Option<u64>,

    /// Replay as fast as possible instead of in real time.
    #[arg(long)]
    pub offline: bool,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(rate) = args.frame_rate {
            self.demo.frame_rate = rate;
        }
        if let Some(secs) = args.duration {
            self.demo.duration_secs = secs;
        }
        if let Some(ms) = args.report_interval {
            self.demo.report_interval_ms = ms;
        }
        if let Some(ms) = args.probe_interval {
            self.terrain.probe_interval_ms = ms;
        }
        if args.offline {
            self.demo.realtime = false;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}
