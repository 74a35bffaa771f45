//! Ground clamping: converge a vertical offset between remote and local ground.

use contrail_config::TerrainConfig;
use contrail_math::{feet_to_meters, meters_to_feet};
use tracing::{debug, trace};

use crate::history::{
    TerrainElevationData, TerrainElevationHistory, TerrainUsability, UsabilityThresholds,
};
use crate::probe::{TerrainProbe, WorldPoint};

/// Per-frame inputs to [`GroundClampController::update`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GroundClampInput {
    /// Monotonic milliseconds.
    pub now_ms: u64,
    /// Seconds since the previous frame.
    pub elapsed_secs: f64,
    /// Current render frame rate.
    pub frame_rate: f32,
    /// Where the aircraft is drawn this frame.
    pub location: WorldPoint,
    /// Extrapolated true altitude (ft).
    pub altitude_true_ft: f64,
    /// Last reported height above the remote ground (ft), if known.
    pub altitude_agl_ft: Option<f64>,
    /// Whether the remote pilot reports being on the ground.
    pub on_ground: bool,
    /// Main gear compression allowed below local ground while on ground (m).
    pub gear_deflection_m: f64,
}

/// What happened during one clamp update.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClampOutcome {
    /// A probe ran this frame (whether or not it found ground).
    pub probed: bool,
    pub usability: TerrainUsability,
}

/// Keeps a remote aircraft on the local ground.
///
/// The offset only ever moves at a bounded rate, so a changed target never
/// shows up as a vertical jump. When terrain data is not usable the target
/// is held where it last settled.
#[derive(Clone, Debug)]
pub struct GroundClampController {
    config: TerrainConfig,
    thresholds: UsabilityThresholds,
    history: TerrainElevationHistory,
    last_probe_ms: Option<u64>,
    local_terrain_elevation: Option<f64>,
    target_terrain_offset: f64,
    terrain_offset: f64,
    terrain_offset_magnitude: f64,
    terrain_offset_finished: bool,
    adjusted_altitude: Option<f64>,
    clamp_decided: bool,
}

impl GroundClampController {
    pub fn new(config: &TerrainConfig) -> Self {
        Self {
            thresholds: UsabilityThresholds::from(config),
            history: TerrainElevationHistory::new(config.history_capacity, config.usable_age_ms),
            config: config.clone(),
            last_probe_ms: None,
            local_terrain_elevation: None,
            target_terrain_offset: 0.0,
            terrain_offset: 0.0,
            terrain_offset_magnitude: 0.0,
            terrain_offset_finished: false,
            adjusted_altitude: None,
            clamp_decided: false,
        }
    }

    /// Runs one frame of ground clamping.
    pub fn update(
        &mut self,
        input: &GroundClampInput,
        probe: &mut dyn TerrainProbe,
    ) -> ClampOutcome {
        let probed = self.probe_if_due(input, probe);

        let agl_m = input.altitude_agl_ft.map(feet_to_meters);
        let usability = self.history.evaluate(input.now_ms, agl_m, &self.thresholds);

        if usability.usable
            && let Some(new_target) = usability.mean_offset_m
        {
            if !self.clamp_decided
                || (new_target - self.target_terrain_offset).abs() > self.config.offset_tolerance_m
            {
                self.target_terrain_offset = new_target;
                self.terrain_offset_magnitude = (new_target - self.terrain_offset).abs();
                trace!(
                    target = new_target,
                    magnitude = self.terrain_offset_magnitude,
                    "terrain offset target moved"
                );
            }
            self.clamp_decided = true;
        }

        self.converge(input.elapsed_secs);
        self.terrain_offset_finished = (self.target_terrain_offset - self.terrain_offset).abs()
            <= self.config.offset_tolerance_m;

        if self.clamp_decided {
            self.adjusted_altitude = Some(self.ensure_above_ground(input));
        }

        ClampOutcome { probed, usability }
    }

    fn probe_if_due(&mut self, input: &GroundClampInput, probe: &mut dyn TerrainProbe) -> bool {
        let mut interval = self.config.probe_interval_ms;
        if input.frame_rate > 0.0 && input.frame_rate < self.config.low_frame_rate {
            interval = interval.saturating_mul(2);
        }
        if self
            .last_probe_ms
            .is_some_and(|last| input.now_ms.saturating_sub(last) < interval)
        {
            return false;
        }
        self.last_probe_ms = Some(input.now_ms);

        let Some(local) = probe.probe(input.location).filter(|e| e.is_finite()) else {
            debug!(
                lat = input.location.latitude,
                lon = input.location.longitude,
                "terrain probe found no ground"
            );
            return true;
        };
        self.local_terrain_elevation = Some(local);

        if let Some(agl_ft) = input.altitude_agl_ft {
            let remote = feet_to_meters(input.altitude_true_ft - agl_ft);
            self.history.push(TerrainElevationData {
                timestamp_ms: input.now_ms,
                location: input.location,
                remote_value: remote,
                local_value: local,
            });
        }
        true
    }

    fn converge(&mut self, elapsed_secs: f64) {
        if !(elapsed_secs > 0.0) || !elapsed_secs.is_finite() {
            return;
        }
        let transition = self.config.offset_transition_secs.max(f64::EPSILON);
        let rate = (self.terrain_offset_magnitude / transition).clamp(
            self.config.min_offset_rate_mps,
            self.config.max_offset_rate_mps.max(self.config.min_offset_rate_mps),
        );
        let step = rate * elapsed_secs;
        let remaining = self.target_terrain_offset - self.terrain_offset;
        if remaining.abs() <= step {
            self.terrain_offset = self.target_terrain_offset;
        } else {
            self.terrain_offset += step.copysign(remaining);
        }
    }

    /// Adjusted altitude (ft) floored at the local ground. While on the ground
    /// the floor drops by the gear deflection so touchdowns compress.
    fn ensure_above_ground(&self, input: &GroundClampInput) -> f64 {
        let adjusted = input.altitude_true_ft + meters_to_feet(self.terrain_offset);
        match self.local_terrain_elevation {
            Some(ground) => {
                let deflection = if input.on_ground {
                    input.gear_deflection_m.max(0.0)
                } else {
                    0.0
                };
                adjusted.max(meters_to_feet(ground - deflection))
            }
            None => adjusted,
        }
    }

    pub fn history(&self) -> &TerrainElevationHistory {
        &self.history
    }

    pub fn has_usable_terrain_elevation_data(&self) -> bool {
        self.history.has_usable_data()
    }

    /// Last successfully probed local ground elevation (m).
    pub fn local_terrain_elevation(&self) -> Option<f64> {
        self.local_terrain_elevation
    }

    pub fn target_terrain_offset(&self) -> f64 {
        self.target_terrain_offset
    }

    /// Current vertical offset applied to the reported altitude (m).
    pub fn terrain_offset(&self) -> f64 {
        self.terrain_offset
    }

    /// Distance to the target when it last moved (m).
    pub fn terrain_offset_magnitude(&self) -> f64 {
        self.terrain_offset_magnitude
    }

    pub fn terrain_offset_finished(&self) -> bool {
        self.terrain_offset_finished
    }

    /// Altitude the renderer should draw (ft); `None` until the first
    /// usable clamp decision.
    pub fn adjusted_altitude(&self) -> Option<f64> {
        self.adjusted_altitude
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::FixedTerrainProbe;

    const FRAME: f64 = 1.0 / 60.0;

    fn input(now_ms: u64, altitude_true_ft: f64, agl_ft: Option<f64>) -> GroundClampInput {
        GroundClampInput {
            now_ms,
            elapsed_secs: FRAME,
            frame_rate: 60.0,
            location: WorldPoint::new(40.0, -75.0),
            altitude_true_ft,
            altitude_agl_ft: agl_ft,
            on_ground: false,
            gear_deflection_m: 0.5,
        }
    }

    /// Aircraft hovering 50 m above remote ground at 100 m MSL.
    fn low_pass(now_ms: u64) -> GroundClampInput {
        input(
            now_ms,
            meters_to_feet(150.0),
            Some(meters_to_feet(50.0)),
        )
    }

    fn run_frames(
        controller: &mut GroundClampController,
        probe: &mut dyn TerrainProbe,
        start_ms: u64,
        frames: u64,
        make: impl Fn(u64) -> GroundClampInput,
    ) -> u64 {
        let mut now = start_ms;
        for _ in 0..frames {
            controller.update(&make(now), probe);
            now += 16;
        }
        now
    }

    #[test]
    fn test_adjusted_altitude_absent_until_usable() {
        let mut controller = GroundClampController::new(&TerrainConfig::default());
        let mut probe = FixedTerrainProbe::new(100.0);
        controller.update(&input(0, 5_000.0, Some(3_000.0)), &mut probe);
        assert!(controller.adjusted_altitude().is_none());
        assert!(!controller.has_usable_terrain_elevation_data());
    }

    #[test]
    fn test_matching_terrain_converges_to_zero_offset() {
        let mut controller = GroundClampController::new(&TerrainConfig::default());
        let mut probe = FixedTerrainProbe::new(100.05);
        run_frames(&mut controller, &mut probe, 0, 120, low_pass);

        assert!(controller.has_usable_terrain_elevation_data());
        assert!(controller.terrain_offset().abs() < 0.1);
        assert!(controller.terrain_offset_finished());
        let adjusted = controller.adjusted_altitude().unwrap();
        assert!((adjusted - meters_to_feet(150.0)).abs() < meters_to_feet(0.1));
    }

    #[test]
    fn test_offset_moves_at_bounded_rate() {
        let config = TerrainConfig::default();
        let mut controller = GroundClampController::new(&config);
        let mut probe = FixedTerrainProbe::new(110.0);

        let mut previous = controller.terrain_offset();
        let mut now = 0;
        for _ in 0..30 {
            controller.update(&low_pass(now), &mut probe);
            let step = (controller.terrain_offset() - previous).abs();
            assert!(
                step <= config.max_offset_rate_mps * FRAME + 1e-9,
                "offset jumped by {step}"
            );
            previous = controller.terrain_offset();
            now += 16;
        }
        assert!((controller.target_terrain_offset() - 10.0).abs() < 1e-9);
        assert!(controller.terrain_offset() > 0.0);
        assert!(controller.terrain_offset() < 10.0);
        assert!(!controller.terrain_offset_finished());
    }

    #[test]
    fn test_offset_reaches_target_without_overshoot() {
        let mut controller = GroundClampController::new(&TerrainConfig::default());
        let mut probe = FixedTerrainProbe::new(104.0);
        let mut max_seen: f64 = 0.0;
        let mut now = 0;
        for _ in 0..600 {
            controller.update(&low_pass(now), &mut probe);
            max_seen = max_seen.max(controller.terrain_offset());
            now += 16;
        }
        assert!(max_seen <= 4.0 + 1e-9);
        assert!((controller.terrain_offset() - 4.0).abs() < 1e-9);
        assert!(controller.terrain_offset_finished());
    }

    #[test]
    fn test_offset_held_when_data_becomes_unusable() {
        let mut controller = GroundClampController::new(&TerrainConfig::default());
        let mut probe = FixedTerrainProbe::new(103.0);
        let now = run_frames(&mut controller, &mut probe, 0, 300, low_pass);
        let settled = controller.terrain_offset();
        assert!((settled - 3.0).abs() < 1e-9);

        // Climb out: AGL 500 m makes the data unusable; the scenery changes
        // underneath but the offset stays put.
        probe.set_elevation(Some(140.0));
        let climb = |t| input(t, meters_to_feet(600.0), Some(meters_to_feet(500.0)));
        run_frames(&mut controller, &mut probe, now, 120, climb);
        assert!(!controller.has_usable_terrain_elevation_data());
        assert!((controller.terrain_offset() - settled).abs() < 1e-9);
        assert!(controller.adjusted_altitude().is_some());
    }

    #[test]
    fn test_probe_is_throttled() {
        let mut controller = GroundClampController::new(&TerrainConfig::default());
        let mut probe = FixedTerrainProbe::new(100.0);
        // 60 frames at 16 ms = 960 ms → probes at 0, 256, 512, 768.
        run_frames(&mut controller, &mut probe, 0, 60, low_pass);
        assert_eq!(probe.calls(), 4);
    }

    #[test]
    fn test_low_frame_rate_doubles_probe_interval() {
        let mut controller = GroundClampController::new(&TerrainConfig::default());
        let mut probe = FixedTerrainProbe::new(100.0);
        let slow = |t| GroundClampInput {
            frame_rate: 10.0,
            ..low_pass(t)
        };
        run_frames(&mut controller, &mut probe, 0, 60, slow);
        // 500 ms interval → probes at 0 and 512.
        assert_eq!(probe.calls(), 2);
    }

    #[test]
    fn test_probe_failure_is_not_fatal() {
        let mut controller = GroundClampController::new(&TerrainConfig::default());
        let mut probe = FixedTerrainProbe::unavailable();
        let outcome = controller.update(&low_pass(0), &mut probe);
        assert!(outcome.probed);
        assert!(!outcome.usability.usable);
        assert!(controller.local_terrain_elevation().is_none());
        assert!(controller.adjusted_altitude().is_none());
    }

    #[test]
    fn test_zero_elapsed_does_not_converge() {
        let mut controller = GroundClampController::new(&TerrainConfig::default());
        let mut probe = FixedTerrainProbe::new(110.0);
        let frozen = |t| GroundClampInput {
            elapsed_secs: 0.0,
            ..low_pass(t)
        };
        run_frames(&mut controller, &mut probe, 0, 10, frozen);
        assert!((controller.target_terrain_offset() - 10.0).abs() < 1e-9);
        assert_eq!(controller.terrain_offset(), 0.0);
    }

    #[test]
    fn test_adjusted_altitude_never_below_local_ground() {
        let mut controller = GroundClampController::new(&TerrainConfig::default());
        // Local ground 20 m above remote ground; aircraft reported on the
        // remote runway. Before the offset converges the floor holds it up.
        let mut probe = FixedTerrainProbe::new(120.0);
        let rolling = |t| GroundClampInput {
            on_ground: true,
            ..input(t, meters_to_feet(100.0), Some(0.0))
        };
        run_frames(&mut controller, &mut probe, 0, 5, rolling);
        let adjusted = controller.adjusted_altitude().unwrap();
        assert!(adjusted >= meters_to_feet(120.0 - 0.5) - 1e-6);
        assert!(adjusted < meters_to_feet(120.0));
    }
}
