//! Timed surface animation and engine state.
//!
//! Reports only say where a surface should end up; each channel then moves
//! toward its target at the rate its flight model allows.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::flight_model::FlightModel;

/// Accumulated float error tolerated when landing on a target.
const LANDING_EPSILON: f64 = 1e-9;

// ---------------------------------------------------------------------------
// SurfaceChannel
// ---------------------------------------------------------------------------

/// One animated surface, position and target in `[0, 1]`.
#[derive(Clone, Debug, PartialEq)]
pub struct SurfaceChannel {
    name: &'static str,
    position: f64,
    target: f64,
    duration_ms: f64,
    warned: bool,
}

impl SurfaceChannel {
    /// A retracted channel taking `duration_ms` for a full 0 → 1 travel.
    pub fn new(name: &'static str, duration_ms: f64) -> Self {
        Self {
            name,
            position: 0.0,
            target: 0.0,
            duration_ms,
            warned: false,
        }
    }

    /// Sets where the channel should go. Non-finite targets are ignored.
    pub fn set_target(&mut self, target: f64) {
        if target.is_finite() {
            self.target = target.clamp(0.0, 1.0);
        }
    }

    /// Jumps straight to the target.
    pub fn snap(&mut self) {
        self.position = self.target;
    }

    /// Moves toward the target by `elapsed_ms / duration_ms`, landing
    /// exactly on it. A zero, negative or non-finite duration moves
    /// instantly.
    pub fn advance(&mut self, elapsed_ms: f64) {
        if !(elapsed_ms > 0.0) || !elapsed_ms.is_finite() {
            return;
        }
        if !(self.duration_ms > 0.0) || !self.duration_ms.is_finite() {
            if !self.warned {
                warn!(
                    channel = self.name,
                    duration_ms = self.duration_ms,
                    "invalid surface duration, moving instantly"
                );
                self.warned = true;
            }
            self.position = self.target;
            return;
        }

        let step = elapsed_ms / self.duration_ms;
        let remaining = self.target - self.position;
        if remaining.abs() <= step + LANDING_EPSILON {
            self.position = self.target;
        } else {
            self.position = (self.position + step.copysign(remaining)).clamp(0.0, 1.0);
        }
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn target(&self) -> f64 {
        self.target
    }

    pub fn at_target(&self) -> bool {
        self.position == self.target
    }
}

// ---------------------------------------------------------------------------
// Reports & flags
// ---------------------------------------------------------------------------

/// Surface and engine configuration as reported by the remote pilot.
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct SurfaceReport {
    pub gear_down: bool,
    /// Flap extension, 0 (up) to 1 (full).
    pub flaps: f64,
    pub spoilers_deployed: bool,
    /// Partial spoiler extension when known; full when deployed otherwise.
    pub spoiler_fraction: Option<f64>,
    pub engines_running: bool,
    pub engines_reversing: bool,
}

/// Engine on/off edge, used to start or stop engine sound.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineTransition {
    Started,
    Stopped,
}

/// Current channel positions for the renderer.
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct SurfaceFractions {
    pub gear: f64,
    pub flaps: f64,
    pub spoilers: f64,
    pub reverser: f64,
}

// ---------------------------------------------------------------------------
// Surfaces
// ---------------------------------------------------------------------------

/// All animated channels of one aircraft plus engine state.
#[derive(Clone, Debug)]
pub struct Surfaces {
    gear: SurfaceChannel,
    flaps: SurfaceChannel,
    spoilers: SurfaceChannel,
    reverser: SurfaceChannel,
    is_engines_running: bool,
    was_engines_running: bool,
}

impl Surfaces {
    /// Channels timed by `model`, everything retracted and engines off.
    pub fn new(model: &FlightModel) -> Self {
        Self {
            gear: SurfaceChannel::new("gear", model.gear_duration_ms),
            flaps: SurfaceChannel::new("flaps", model.flaps_duration_ms),
            spoilers: SurfaceChannel::new("spoilers", model.spoiler_duration_ms),
            reverser: SurfaceChannel::new("reverser", model.reverser_duration_ms),
            is_engines_running: false,
            was_engines_running: false,
        }
    }

    /// Sets the channel targets from `report`. With `snap` the channels jump
    /// there, used before an aircraft is first drawn.
    pub fn apply_report(&mut self, report: &SurfaceReport, snap: bool) {
        self.gear.set_target(if report.gear_down { 1.0 } else { 0.0 });
        self.flaps.set_target(report.flaps);
        self.spoilers.set_target(if report.spoilers_deployed {
            report.spoiler_fraction.unwrap_or(1.0)
        } else {
            0.0
        });
        self.reverser
            .set_target(if report.engines_reversing { 1.0 } else { 0.0 });
        self.is_engines_running = report.engines_running;

        if snap {
            for channel in self.channels_mut() {
                channel.snap();
            }
        }
    }

    /// Advances every channel by `elapsed_ms`.
    pub fn advance(&mut self, elapsed_ms: f64) {
        for channel in self.channels_mut() {
            channel.advance(elapsed_ms);
        }
    }

    fn channels_mut(&mut self) -> [&mut SurfaceChannel; 4] {
        [
            &mut self.gear,
            &mut self.flaps,
            &mut self.spoilers,
            &mut self.reverser,
        ]
    }

    /// Reports the engine edge since the last call, then remembers the
    /// current state.
    pub fn take_engine_transition(&mut self) -> Option<EngineTransition> {
        let transition = match (self.was_engines_running, self.is_engines_running) {
            (false, true) => Some(EngineTransition::Started),
            (true, false) => Some(EngineTransition::Stopped),
            _ => None,
        };
        self.was_engines_running = self.is_engines_running;
        transition
    }

    /// Gear is down only once fully extended.
    pub fn is_gear_down(&self) -> bool {
        self.gear.target() >= 1.0 && self.gear.position() >= 1.0
    }

    pub fn is_spoilers_deployed(&self) -> bool {
        self.spoilers.target() > 0.0 && self.spoilers.at_target()
    }

    pub fn is_engines_reversing(&self) -> bool {
        self.reverser.target() >= 1.0 && self.reverser.position() >= 1.0
    }

    pub fn is_engines_running(&self) -> bool {
        self.is_engines_running
    }

    pub fn was_engines_running(&self) -> bool {
        self.was_engines_running
    }

    pub fn gear(&self) -> &SurfaceChannel {
        &self.gear
    }

    pub fn flaps(&self) -> &SurfaceChannel {
        &self.flaps
    }

    pub fn spoilers(&self) -> &SurfaceChannel {
        &self.spoilers
    }

    pub fn reverser(&self) -> &SurfaceChannel {
        &self.reverser
    }

    pub fn fractions(&self) -> SurfaceFractions {
        SurfaceFractions {
            gear: self.gear.position(),
            flaps: self.flaps.position(),
            spoilers: self.spoilers.position(),
            reverser: self.reverser.position(),
        }
    }
}
