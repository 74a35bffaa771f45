//! Replays a scripted remote approach through the aircraft tracker.
//!
//! Configuration is loaded from `config.ron` and can be overridden via CLI flags.
//! Run with `cargo run -p contrail-demo` to watch one aircraft land in real time,
//! or `cargo run -p contrail-demo -- --offline` for a fixed-step replay.

mod clock;
mod error;
mod platform;
mod replay;
mod script;

use std::process::ExitCode;

use clap::Parser;
use contrail_aircraft::{FlightModelTable, encode};
use contrail_config::{CliArgs, Config};
use contrail_terrain::{HeightmapParams, HeightmapTerrainProbe};
use tracing::info;

use crate::error::DemoError;
use crate::platform::PlatformDirs;

fn main() -> ExitCode {
    let args = CliArgs::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("contrail: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &CliArgs) -> Result<(), DemoError> {
    let dirs = PlatformDirs::resolve(args.config.as_deref())?;
    dirs.create_dirs()?;

    // Load or create config, then apply CLI overrides
    let mut config = Config::load_or_create(&dirs.config_dir)?;
    config.apply_cli_overrides(args);

    contrail_log::init_logging(Some(&dirs.log_dir), config.debug.file_logging, Some(&config));
    info!(
        config = %dirs.config_dir.display(),
        realtime = config.demo.realtime,
        frame_rate = config.demo.frame_rate,
        "contrail replay starting"
    );

    let models = FlightModelTable::from_config(&config.flight_models)?;
    info!(rules = models.len(), "flight model table ready");

    let mut probe = HeightmapTerrainProbe::new(HeightmapParams {
        seed: config.demo.terrain_seed,
        ..Default::default()
    });
    let script = replay::approach_for(&config, &mut probe);
    let summary = replay::run(&config, &models, &script, &mut probe)?;

    info!(
        frames = summary.frames,
        updates = summary.updates_applied,
        engine_transitions = summary.engine_transitions,
        max_vertical_step_ft = format_args!("{:.2}", summary.max_vertical_step_ft),
        altitude_ft = format_args!("{:.1}", summary.final_pose.altitude),
        gear_down = summary.gear_down,
        on_ground = summary.on_ground,
        "replay finished"
    );
    if let Some(snapshot) = &summary.last_export {
        let bytes = encode(snapshot)?;
        info!(bytes = bytes.len(), version = snapshot.version, "last bulk snapshot");
    }
    Ok(())
}
