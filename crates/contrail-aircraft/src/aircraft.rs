//! One tracked remote aircraft: everything the render loop needs to draw it.

use contrail_config::Config;
use contrail_math::{ground_distance_m, mps_to_knots};
use contrail_terrain::{GroundClampController, GroundClampInput, TerrainProbe};
use glam::{DQuat, EulerRot};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use crate::export::{BulkData, BulkInfoTexts, SharedBulkData};
use crate::extrapolation::Extrapolator;
use crate::flight_model::{EngineClass, FlightModel, FlightModelTable, ModelKey};
use crate::inbox::{AircraftUpdate, UpdateReceiver};
use crate::surfaces::{EngineTransition, SurfaceFractions, SurfaceReport, Surfaces};
use crate::visual_state::{AircraftVisualState, FrameTick, PositionReport};

// ---------------------------------------------------------------------------
// Identity & render types
// ---------------------------------------------------------------------------

/// Who the aircraft is and which model draws it.
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AircraftIdentity {
    /// Network id.
    pub callsign: String,
    pub icao_type: String,
    pub icao_airline: String,
    pub livery: String,
    pub model_name: String,
    pub mode_s_id: u32,
    /// ICAO Doc 8643 description of the rendered model, e.g. `L2J`.
    pub classification: String,
    /// Wake turbulence category of the rendered model.
    pub wtc: String,
}

impl AircraftIdentity {
    pub fn model_key(&self) -> ModelKey {
        ModelKey::new(&self.classification, &self.wtc, &self.icao_type)
    }
}

/// Handle of an audio channel owned by the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SoundChannelId(pub u32);

/// Where and how to draw the aircraft this frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderPose {
    pub latitude: f64,
    pub longitude: f64,
    /// Terrain-adjusted altitude when available, else extrapolated (ft).
    pub altitude: f64,
    pub pitch: f64,
    pub heading: f64,
    pub bank: f64,
    pub nose_wheel_angle: f64,
}

impl RenderPose {
    /// Body attitude in a local north-east-down frame: yaw by heading,
    /// then pitch, then bank.
    pub fn attitude(&self) -> DQuat {
        DQuat::from_euler(
            EulerRot::ZYX,
            self.heading.to_radians(),
            self.pitch.to_radians(),
            self.bank.to_radians(),
        )
    }
}

/// Anything the render loop can draw.
pub trait RenderableAircraft {
    fn render_pose(&self) -> RenderPose;
    fn surface_fractions(&self) -> SurfaceFractions;
}

/// What happened during one [`NetworkAircraft::update`].
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct FrameEvents {
    /// This was the first frame the aircraft was drawn.
    pub first_render: bool,
    pub engine_transition: Option<EngineTransition>,
    pub probed_terrain: bool,
}

// ---------------------------------------------------------------------------
// NetworkAircraft
// ---------------------------------------------------------------------------

/// A remote aircraft tracked on the render thread.
#[derive(Debug)]
pub struct NetworkAircraft {
    identity: AircraftIdentity,
    origin: String,
    destination: String,
    flight_model: FlightModel,
    sound_channel: Option<SoundChannelId>,
    extrapolator: Extrapolator,
    ground_clamp: GroundClampController,
    surfaces: Surfaces,
    is_reported_on_ground: bool,
    ground_speed: f64,
    last_update_ms: Option<u64>,
    export: Option<SharedBulkData>,
    info_changed: bool,
}

impl NetworkAircraft {
    /// Starts tracking from the first report, received at `now_ms`. The
    /// flight model is resolved here and never changes afterwards.
    pub fn new(
        identity: AircraftIdentity,
        initial: AircraftVisualState,
        now_ms: u64,
        models: &FlightModelTable,
        config: &Config,
    ) -> Self {
        let flight_model = models.resolve(&identity.model_key());
        info!(
            callsign = %identity.callsign,
            model = %identity.model_key(),
            category = %flight_model.category,
            "tracking aircraft"
        );
        Self {
            surfaces: Surfaces::new(&flight_model),
            extrapolator: Extrapolator::new(&config.extrapolation, initial, now_ms),
            ground_clamp: GroundClampController::new(&config.terrain),
            identity,
            origin: String::new(),
            destination: String::new(),
            flight_model,
            sound_channel: None,
            is_reported_on_ground: false,
            ground_speed: 0.0,
            last_update_ms: None,
            export: None,
            info_changed: true,
        }
    }

    /// Publishes [`BulkData`] into `shared` after every update, and the
    /// info texts whenever they change.
    pub fn attach_export(&mut self, shared: SharedBulkData) {
        self.export = Some(shared);
        self.info_changed = true;
    }

    // -- inbound --------------------------------------------------------------

    /// Returns `false` if the report was dropped.
    pub fn apply_position_report(&mut self, report: PositionReport) -> bool {
        if !self.extrapolator.apply_report(&report) {
            return false;
        }
        self.is_reported_on_ground = report.on_ground;
        self.ground_speed = match report.ground_speed.filter(|s| s.is_finite()) {
            Some(knots) => knots,
            None => {
                let v = self.extrapolator.positional_velocities();
                mps_to_knots(ground_distance_m(v.x, v.y, report.state.latitude))
            }
        };
        trace!(callsign = %self.identity.callsign, t = report.timestamp_ms, "position report");
        true
    }

    /// Surfaces jump to the reported state if the aircraft has not been
    /// drawn yet, and animate otherwise.
    pub fn apply_surface_report(&mut self, report: SurfaceReport) {
        let snap = self.extrapolator.is_first_render_pending();
        self.surfaces.apply_report(&report, snap);
    }

    pub fn update_info(&mut self, origin: impl Into<String>, destination: impl Into<String>) {
        self.origin = origin.into();
        self.destination = destination.into();
        self.info_changed = true;
    }

    pub fn apply(&mut self, update: AircraftUpdate) {
        match update {
            AircraftUpdate::Position(report) => {
                self.apply_position_report(report);
            }
            AircraftUpdate::Surfaces(report) => self.apply_surface_report(report),
            AircraftUpdate::Info {
                origin,
                destination,
            } => self.update_info(origin, destination),
        }
    }

    /// Applies every pending update in arrival order. Returns how many.
    pub fn drain(&mut self, inbox: &mut UpdateReceiver) -> usize {
        let updates = inbox.drain();
        let count = updates.len();
        for update in updates {
            self.apply(update);
        }
        count
    }

    // -- per frame ------------------------------------------------------------

    /// Extrapolates, clamps to the local ground, and animates surfaces.
    pub fn update(&mut self, tick: &FrameTick, probe: &mut dyn TerrainProbe) -> FrameEvents {
        let first_render = self.extrapolator.consume_first_render();
        self.extrapolator.tick(tick.now_ms, tick.elapsed_secs);

        let predicted = *self.extrapolator.predicted_visual_state();
        let outcome = self.ground_clamp.update(
            &GroundClampInput {
                now_ms: tick.now_ms,
                elapsed_secs: tick.elapsed_secs,
                frame_rate: tick.frame_rate,
                location: predicted.location(),
                altitude_true_ft: predicted.altitude_true,
                altitude_agl_ft: predicted.altitude_agl,
                on_ground: self.is_reported_on_ground,
                gear_deflection_m: self.flight_model.gear_deflection_m,
            },
            probe,
        );

        if tick.elapsed_secs.is_finite() {
            self.surfaces.advance(tick.elapsed_secs * 1_000.0);
        }
        let engine_transition = self.surfaces.take_engine_transition();
        if let Some(transition) = engine_transition {
            debug!(callsign = %self.identity.callsign, ?transition, "engine state changed");
        }

        self.last_update_ms = Some(tick.now_ms);
        if let Some(shared) = &self.export {
            if self.info_changed {
                shared.publish_info(self.info_texts());
                self.info_changed = false;
            }
            shared.publish_data(tick.now_ms, self.bulk_data());
        }

        FrameEvents {
            first_render,
            engine_transition,
            probed_terrain: outcome.probed,
        }
    }

    // -- export ---------------------------------------------------------------

    pub fn bulk_data(&self) -> BulkData {
        let predicted = self.extrapolator.predicted_visual_state();
        let fractions = self.surfaces.fractions();
        BulkData {
            key: self.identity.mode_s_id,
            latitude: predicted.latitude,
            longitude: predicted.longitude,
            altitude_true: predicted.altitude_true,
            altitude_adjusted: self.ground_clamp.adjusted_altitude(),
            altitude_agl: predicted.altitude_agl,
            pitch: predicted.pitch,
            heading: predicted.heading,
            bank: predicted.bank,
            nose_wheel_angle: predicted.nose_wheel_angle,
            positional_velocities: self.extrapolator.positional_velocities(),
            rotational_velocities: self.extrapolator.rotational_velocities(),
            ground_speed: self.ground_speed,
            on_ground: self.is_reported_on_ground,
            gear: fractions.gear,
            flaps: fractions.flaps,
            spoilers: fractions.spoilers,
            reverser: fractions.reverser,
            gear_down: self.surfaces.is_gear_down(),
            spoilers_deployed: self.surfaces.is_spoilers_deployed(),
            engines_running: self.surfaces.is_engines_running(),
            engines_reversing: self.surfaces.is_engines_reversing(),
            terrain_offset: self.ground_clamp.terrain_offset(),
        }
    }

    pub fn info_texts(&self) -> BulkInfoTexts {
        BulkInfoTexts {
            key: self.identity.mode_s_id,
            callsign: self.identity.callsign.clone(),
            icao_type: self.identity.icao_type.clone(),
            icao_airline: self.identity.icao_airline.clone(),
            livery: self.identity.livery.clone(),
            model_name: self.identity.model_name.clone(),
            origin: self.origin.clone(),
            destination: self.destination.clone(),
        }
    }

    // -- accessors ------------------------------------------------------------

    pub fn identity(&self) -> &AircraftIdentity {
        &self.identity
    }

    pub fn callsign(&self) -> &str {
        &self.identity.callsign
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }

    pub fn flight_model(&self) -> &FlightModel {
        &self.flight_model
    }

    pub fn engine_class(&self) -> EngineClass {
        self.flight_model.engine_class
    }

    pub fn sound_channel(&self) -> Option<SoundChannelId> {
        self.sound_channel
    }

    /// Stores the host's channel for this aircraft, returning the previous one.
    pub fn set_sound_channel(&mut self, channel: Option<SoundChannelId>) -> Option<SoundChannelId> {
        std::mem::replace(&mut self.sound_channel, channel)
    }

    pub fn extrapolator(&self) -> &Extrapolator {
        &self.extrapolator
    }

    pub fn ground_clamp(&self) -> &GroundClampController {
        &self.ground_clamp
    }

    pub fn surfaces(&self) -> &Surfaces {
        &self.surfaces
    }

    pub fn visual_state(&self) -> &AircraftVisualState {
        self.extrapolator.visual_state()
    }

    pub fn predicted_visual_state(&self) -> &AircraftVisualState {
        self.extrapolator.predicted_visual_state()
    }

    pub fn fast_positions_received_count(&self) -> u32 {
        self.extrapolator.fast_positions_received()
    }

    pub fn is_first_render_pending(&self) -> bool {
        self.extrapolator.is_first_render_pending()
    }

    pub fn is_reported_on_ground(&self) -> bool {
        self.is_reported_on_ground
    }

    /// Knots.
    pub fn ground_speed(&self) -> f64 {
        self.ground_speed
    }

    pub fn terrain_offset_finished(&self) -> bool {
        self.ground_clamp.terrain_offset_finished()
    }

    pub fn adjusted_altitude(&self) -> Option<f64> {
        self.ground_clamp.adjusted_altitude()
    }

    pub fn last_update_ms(&self) -> Option<u64> {
        self.last_update_ms
    }
}

impl RenderableAircraft for NetworkAircraft {
    fn render_pose(&self) -> RenderPose {
        let predicted = self.extrapolator.predicted_visual_state();
        RenderPose {
            latitude: predicted.latitude,
            longitude: predicted.longitude,
            altitude: self
                .ground_clamp
                .adjusted_altitude()
                .unwrap_or(predicted.altitude_true),
            pitch: predicted.pitch,
            heading: predicted.heading,
            bank: predicted.bank,
            nose_wheel_angle: predicted.nose_wheel_angle,
        }
    }

    fn surface_fractions(&self) -> SurfaceFractions {
        self.surfaces.fractions()
    }
}
