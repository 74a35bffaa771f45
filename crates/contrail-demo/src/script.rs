//! A scripted remote flight: final approach, touchdown and roll-out.
//!
//! The remote pilot's runway sits at a slightly different elevation than
//! the local scenery, so the replay shows the ground clamp taking up the
//! difference.

use contrail_aircraft::{
    AircraftIdentity, AircraftUpdate, AircraftVisualState, PositionReport, ReportedVelocities,
    SurfaceReport, velocities_between,
};
use contrail_config::ExtrapolationConfig;
use contrail_math::{
    METERS_PER_DEGREE_LAT, meters_per_degree_lon, meters_to_feet, mps_to_knots,
};
use contrail_terrain::WorldPoint;

const GLIDE_SLOPE_DEG: f64 = 3.0;
const APPROACH_SPEED_MPS: f64 = 72.0;
const TAXI_SPEED_MPS: f64 = 10.0;
/// Time to slow from approach to taxi speed after touchdown.
const ROLLOUT_MS: u64 = 20_000;
/// Every n-th report is a plain position report without velocities.
const SLOW_REPORT_EVERY: u64 = 5;

/// Deterministic approach flown by one remote aircraft.
#[derive(Clone, Debug)]
pub struct ApproachScript {
    /// Touchdown point.
    pub touchdown: WorldPoint,
    /// Runway heading (deg true).
    pub heading: f64,
    /// Elevation of the remote pilot's runway (m).
    pub remote_ground_m: f64,
    /// When the main gear touches (ms after start).
    pub touchdown_ms: u64,
    /// When the script ends (ms after start).
    pub duration_ms: u64,
}

impl ApproachScript {
    pub fn identity() -> AircraftIdentity {
        AircraftIdentity {
            callsign: "SWA2417".to_string(),
            icao_type: "B737".to_string(),
            icao_airline: "SWA".to_string(),
            livery: "SWA".to_string(),
            model_name: "B737 SWA".to_string(),
            mode_s_id: 0xA4C3F2,
            classification: "L2J".to_string(),
            wtc: "M".to_string(),
        }
    }

    /// Distance flown along the track at `t_ms`, negative before touchdown (m).
    fn along_track_m(&self, t_ms: u64) -> f64 {
        if t_ms <= self.touchdown_ms {
            -((self.touchdown_ms - t_ms) as f64 / 1_000.0) * APPROACH_SPEED_MPS
        } else {
            let t = ((t_ms - self.touchdown_ms).min(ROLLOUT_MS)) as f64 / 1_000.0;
            let rollout = ROLLOUT_MS as f64 / 1_000.0;
            let decel = (APPROACH_SPEED_MPS - TAXI_SPEED_MPS) / rollout;
            let braking = APPROACH_SPEED_MPS * t - 0.5 * decel * t * t;
            let taxi = (t_ms - self.touchdown_ms).saturating_sub(ROLLOUT_MS) as f64 / 1_000.0
                * TAXI_SPEED_MPS;
            braking + taxi
        }
    }

    fn speed_mps(&self, t_ms: u64) -> f64 {
        if t_ms <= self.touchdown_ms {
            APPROACH_SPEED_MPS
        } else {
            let fraction = (t_ms - self.touchdown_ms).min(ROLLOUT_MS) as f64 / ROLLOUT_MS as f64;
            APPROACH_SPEED_MPS + (TAXI_SPEED_MPS - APPROACH_SPEED_MPS) * fraction
        }
    }

    pub fn is_on_ground(&self, t_ms: u64) -> bool {
        t_ms >= self.touchdown_ms
    }

    /// What the remote pilot's simulator reports at `t_ms`.
    pub fn state_at(&self, t_ms: u64) -> AircraftVisualState {
        let s = self.along_track_m(t_ms);
        let heading = self.heading.to_radians();
        let latitude = self.touchdown.latitude + s * heading.cos() / METERS_PER_DEGREE_LAT;
        let longitude = self.touchdown.longitude
            + s * heading.sin() / meters_per_degree_lon(self.touchdown.latitude);
        let agl_m = (-s).max(0.0) * GLIDE_SLOPE_DEG.to_radians().tan();
        let on_ground = self.is_on_ground(t_ms);
        AircraftVisualState {
            latitude,
            longitude,
            altitude_true: meters_to_feet(self.remote_ground_m + agl_m),
            altitude_agl: Some(meters_to_feet(agl_m)),
            pitch: if on_ground { 0.0 } else { 2.5 },
            heading: self.heading,
            bank: 0.0,
            nose_wheel_angle: 0.0,
        }
    }

    pub fn surfaces_at(&self, t_ms: u64) -> SurfaceReport {
        let on_ground = self.is_on_ground(t_ms);
        let reversing = on_ground && t_ms < self.touchdown_ms + ROLLOUT_MS / 2;
        SurfaceReport {
            gear_down: t_ms >= 2_000,
            flaps: if t_ms >= 5_000 { 1.0 } else { 0.5 },
            spoilers_deployed: on_ground && t_ms < self.touchdown_ms + ROLLOUT_MS,
            spoiler_fraction: None,
            engines_running: true,
            engines_reversing: reversing,
        }
    }

    /// The report sent at `t_ms`. Most carry velocities.
    pub fn report_at(&self, t_ms: u64, sequence: u64, config: &ExtrapolationConfig) -> PositionReport {
        let state = self.state_at(t_ms);
        let mut report = if sequence % SLOW_REPORT_EVERY == 0 {
            PositionReport::slow(t_ms, state)
        } else {
            let velocities: ReportedVelocities =
                velocities_between(&state, &self.state_at(t_ms + 100), 100, config);
            PositionReport::fast(t_ms, state, velocities)
        };
        report.on_ground = self.is_on_ground(t_ms);
        report.ground_speed = Some(mps_to_knots(self.speed_mps(t_ms)));
        report
    }

    /// Every update the network would deliver, in send order, stamped with
    /// the time it is due.
    pub fn timeline(&self, interval_ms: u64, config: &ExtrapolationConfig) -> Vec<(u64, AircraftUpdate)> {
        let interval_ms = interval_ms.max(1);
        let mut updates = vec![(
            0,
            AircraftUpdate::Info {
                origin: "KLAS".to_string(),
                destination: "KPHX".to_string(),
            },
        )];
        let mut previous_surfaces = None;
        let mut sequence = 0;
        let mut t = 0;
        while t <= self.duration_ms {
            updates.push((t, AircraftUpdate::Position(self.report_at(t, sequence, config))));
            let surfaces = self.surfaces_at(t);
            if previous_surfaces != Some(surfaces) {
                updates.push((t, AircraftUpdate::Surfaces(surfaces)));
                previous_surfaces = Some(surfaces);
            }
            sequence += 1;
            t += interval_ms;
        }
        updates
    }
}
