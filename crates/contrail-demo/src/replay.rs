//! Drives one scripted aircraft through the tracker the way a pilot client
//! would: a network thread feeds reports, the render loop drains and draws.

use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use contrail_aircraft::{
    AircraftUpdate, BulkSnapshot, FlightModelTable, NetworkAircraft, RenderPose,
    RenderableAircraft, SharedBulkData, UpdateReceiver, UpdateSender, aircraft_channel,
};
use contrail_config::Config;
use contrail_terrain::{TerrainProbe, WorldPoint};
use tracing::{debug, info};

use crate::clock::{FixedStepClock, FrameSource, WallClock};
use crate::error::DemoError;
use crate::script::ApproachScript;

/// Height of the remote runway above the local one (m).
const REMOTE_GROUND_BIAS_M: f64 = 1.5;
const TOUCHDOWN: WorldPoint = WorldPoint::new(33.4343, -112.0116);
const RUNWAY_HEADING: f64 = 77.0;
const POSE_LOG_INTERVAL_MS: u64 = 1_000;

/// How the replay went.
#[derive(Clone, Debug)]
pub struct ReplaySummary {
    pub frames: u64,
    pub updates_applied: usize,
    pub engine_transitions: usize,
    /// Largest altitude change between two consecutive frames (ft).
    pub max_vertical_step_ft: f64,
    pub final_pose: RenderPose,
    pub gear_down: bool,
    pub on_ground: bool,
    pub local_ground_m: Option<f64>,
    pub gear_deflection_m: f64,
    pub last_export: Option<BulkSnapshot>,
}

/// Lays the approach onto the local scenery, with the remote runway a
/// little higher than ours.
pub fn approach_for(config: &Config, probe: &mut dyn TerrainProbe) -> ApproachScript {
    let duration_ms = u64::from(config.demo.duration_secs) * 1_000;
    let local = probe.probe(TOUCHDOWN).unwrap_or(0.0);
    ApproachScript {
        touchdown: TOUCHDOWN,
        heading: RUNWAY_HEADING,
        remote_ground_m: local + REMOTE_GROUND_BIAS_M,
        touchdown_ms: duration_ms / 2,
        duration_ms,
    }
}

/// Runs the whole script. In real time a feeder thread delivers reports on
/// the wall clock; offline, due reports are queued before each fixed-step
/// frame so the run is reproducible.
pub fn run(
    config: &Config,
    models: &FlightModelTable,
    script: &ApproachScript,
    probe: &mut dyn TerrainProbe,
) -> Result<ReplaySummary, DemoError> {
    let mut timeline = script.timeline(config.demo.report_interval_ms, &config.extrapolation);
    // The first position report is the one tracking starts from.
    timeline.retain(|(due_ms, update)| {
        !(*due_ms == 0 && matches!(update, AircraftUpdate::Position(_)))
    });

    let mut aircraft = NetworkAircraft::new(
        ApproachScript::identity(),
        script.state_at(0),
        0,
        models,
        config,
    );
    let export = SharedBulkData::new();
    aircraft.attach_export(export.clone());

    let (sender, mut inbox) = aircraft_channel();
    let mut summary = if config.demo.realtime {
        let start = Instant::now();
        let feeder = spawn_feeder(timeline, sender, start)?;
        let mut clock = WallClock::new(config.demo.frame_rate, start);
        let summary = render_loop(
            &mut aircraft,
            &mut inbox,
            &mut clock,
            probe,
            script.duration_ms,
            |_| {},
        );
        drop(inbox);
        let sent = feeder.join().map_err(|_| DemoError::FeederPanicked)?;
        debug!(sent, "network feeder finished");
        summary
    } else {
        let mut clock = FixedStepClock::new(config.demo.frame_rate);
        let mut pending = timeline.into_iter().peekable();
        render_loop(
            &mut aircraft,
            &mut inbox,
            &mut clock,
            probe,
            script.duration_ms,
            |now_ms| {
                while let Some((_, update)) = pending.next_if(|(due_ms, _)| *due_ms <= now_ms) {
                    if sender.send(update).is_err() {
                        break;
                    }
                }
            },
        )
    };

    summary.last_export = export.latest();
    Ok(summary)
}

fn spawn_feeder(
    timeline: Vec<(u64, AircraftUpdate)>,
    sender: UpdateSender,
    start: Instant,
) -> Result<JoinHandle<usize>, DemoError> {
    let handle = thread::Builder::new()
        .name("network-feeder".to_string())
        .spawn(move || {
            let mut sent = 0;
            for (due_ms, update) in timeline {
                let due = start + Duration::from_millis(due_ms);
                let now = Instant::now();
                if due > now {
                    thread::sleep(due - now);
                }
                if sender.send(update).is_err() {
                    debug!("render loop stopped, dropping remaining updates");
                    break;
                }
                sent += 1;
            }
            sent
        })?;
    Ok(handle)
}

fn render_loop(
    aircraft: &mut NetworkAircraft,
    inbox: &mut UpdateReceiver,
    clock: &mut dyn FrameSource,
    probe: &mut dyn TerrainProbe,
    duration_ms: u64,
    mut before_frame: impl FnMut(u64),
) -> ReplaySummary {
    let mut frames = 0;
    let mut updates_applied = 0;
    let mut engine_transitions = 0;
    let mut max_vertical_step_ft: f64 = 0.0;
    let mut previous_altitude: Option<f64> = None;
    let mut next_log_ms = 0;

    loop {
        let tick = clock.next_frame();
        before_frame(tick.now_ms);
        updates_applied += aircraft.drain(inbox);
        let events = aircraft.update(&tick, probe);
        frames += 1;

        if events.first_render {
            info!(callsign = aircraft.callsign(), "first render");
        }
        if let Some(transition) = events.engine_transition {
            info!(callsign = aircraft.callsign(), ?transition, "engines");
            engine_transitions += 1;
        }

        let pose = aircraft.render_pose();
        if let Some(previous) = previous_altitude {
            max_vertical_step_ft = max_vertical_step_ft.max((pose.altitude - previous).abs());
        }
        previous_altitude = Some(pose.altitude);

        if tick.now_ms >= next_log_ms {
            let fractions = aircraft.surface_fractions();
            info!(
                t = tick.now_ms,
                lat = format_args!("{:.5}", pose.latitude),
                lon = format_args!("{:.5}", pose.longitude),
                alt_ft = format_args!("{:.1}", pose.altitude),
                gs_kt = format_args!("{:.0}", aircraft.ground_speed()),
                offset_m = format_args!("{:.2}", aircraft.ground_clamp().terrain_offset()),
                gear = format_args!("{:.2}", fractions.gear),
                flaps = format_args!("{:.2}", fractions.flaps),
                "pose"
            );
            next_log_ms += POSE_LOG_INTERVAL_MS;
        }

        if tick.now_ms >= duration_ms {
            break;
        }
    }

    ReplaySummary {
        frames,
        updates_applied,
        engine_transitions,
        max_vertical_step_ft,
        final_pose: aircraft.render_pose(),
        gear_down: aircraft.surfaces().is_gear_down(),
        on_ground: aircraft.is_reported_on_ground(),
        local_ground_m: aircraft.ground_clamp().local_terrain_elevation(),
        gear_deflection_m: aircraft.flight_model().gear_deflection_m,
        last_export: None,
    }
}
