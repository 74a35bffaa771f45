//! Dead reckoning between position reports.
//!
//! The predicted state moves along the velocities derived from the last two
//! reports (or carried by a fast report). When a report arrives, the gap
//! between it and the prediction is not applied at once: it is spread over
//! an error-correction window by an extra "error velocity" that starts at
//! twice the average rate and ramps linearly down to zero, so the drawn
//! aircraft never jumps and the whole gap is closed exactly when the window
//! ends.

use contrail_config::ExtrapolationConfig;
use contrail_math::{
    Vector3, feet_to_meters, ground_distance_m, normalize_signed, shortest_angle_delta,
};
use tracing::{debug, trace};

use crate::visual_state::{AircraftVisualState, PositionReport, ReportedVelocities};

// ---------------------------------------------------------------------------
// Velocity derivation
// ---------------------------------------------------------------------------

/// Velocities implied by moving from `prev` to `next` in `delta_ms`.
///
/// Heading and bank take the shorter arc, so 350° → 10° over one second is
/// +20°/s. Returns zero velocities when the interval is not positive or
/// longer than `max_report_gap_ms`, or when the result fails
/// [`sanitize_velocities`].
pub fn velocities_between(
    prev: &AircraftVisualState,
    next: &AircraftVisualState,
    delta_ms: i64,
    config: &ExtrapolationConfig,
) -> ReportedVelocities {
    if delta_ms <= 0 || delta_ms as u64 > config.max_report_gap_ms {
        debug!(delta_ms, "report interval out of range, velocities zeroed");
        return ReportedVelocities::default();
    }
    let dt = delta_ms as f64 / 1_000.0;

    let linear = Vector3::new(
        next.latitude - prev.latitude,
        normalize_signed(next.longitude - prev.longitude),
        next.altitude_true - prev.altitude_true,
    ) / dt;
    let angular = Vector3::new(
        normalize_signed(next.pitch - prev.pitch),
        shortest_angle_delta(prev.heading, next.heading),
        normalize_signed(next.bank - prev.bank),
    ) / dt;

    sanitize_velocities(ReportedVelocities { linear, angular }, next.latitude, config)
        .unwrap_or_default()
}

/// Rejects non-finite velocities and implied ground speeds above
/// `max_ground_speed_mps`.
pub fn sanitize_velocities(
    velocities: ReportedVelocities,
    latitude: f64,
    config: &ExtrapolationConfig,
) -> Option<ReportedVelocities> {
    if !velocities.linear.is_finite() || !velocities.angular.is_finite() {
        debug!("non-finite velocities discarded");
        return None;
    }
    let ground_speed = ground_distance_m(velocities.linear.x, velocities.linear.y, latitude);
    if ground_speed > config.max_ground_speed_mps {
        debug!(ground_speed, "implied ground speed too high, velocities discarded");
        return None;
    }
    Some(velocities)
}

/// `state` advanced along `velocities` for `interval_secs`, angles wrapped.
pub fn extrapolate(
    state: &AircraftVisualState,
    velocities: &ReportedVelocities,
    interval_secs: f64,
) -> AircraftVisualState {
    let linear = velocities.linear * interval_secs;
    let angular = velocities.angular * interval_secs;
    AircraftVisualState {
        latitude: state.latitude + linear.x,
        longitude: state.longitude + linear.y,
        altitude_true: state.altitude_true + linear.z,
        pitch: state.pitch + angular.x,
        heading: state.heading + angular.y,
        bank: state.bank + angular.z,
        ..*state
    }
    .normalized()
}

// ---------------------------------------------------------------------------
// Error correction
// ---------------------------------------------------------------------------

/// An open error-correction window.
#[derive(Clone, Copy, Debug, PartialEq)]
struct ErrorWindow {
    positional: Vector3,
    rotational: Vector3,
    duration_ms: u64,
    until_ms: u64,
    /// Time up to which the correction has already been applied.
    applied_to_ms: u64,
}

impl ErrorWindow {
    fn remaining_ms(&self, t_ms: u64) -> f64 {
        self.until_ms.saturating_sub(t_ms).min(self.duration_ms) as f64
    }

    /// Fraction of the total error covered between `applied_to_ms` and `t_ms`.
    fn fraction_through(&self, t_ms: u64) -> f64 {
        let t = self.duration_ms as f64;
        let r0 = self.remaining_ms(self.applied_to_ms);
        let r1 = self.remaining_ms(t_ms);
        (r0 * r0 - r1 * r1) / (t * t)
    }

    /// Error velocity (per second) at `t_ms`: `2E/T · r/T`.
    fn velocities_at(&self, t_ms: u64) -> (Vector3, Vector3) {
        let t_secs = self.duration_ms as f64 / 1_000.0;
        let scale = 2.0 / t_secs * self.remaining_ms(t_ms) / self.duration_ms as f64;
        (self.positional * scale, self.rotational * scale)
    }
}

// ---------------------------------------------------------------------------
// Extrapolator
// ---------------------------------------------------------------------------

/// Reported and predicted state plus the kinematics linking them.
#[derive(Clone, Debug)]
pub struct Extrapolator {
    config: ExtrapolationConfig,
    visual_state: AircraftVisualState,
    predicted_visual_state: AircraftVisualState,
    positional_velocities: Vector3,
    rotational_velocities: Vector3,
    positional_error_velocities: Vector3,
    rotational_error_velocities: Vector3,
    error_window: Option<ErrorWindow>,
    last_report_ms: u64,
    last_velocity_update_ms: Option<u64>,
    last_slow_position_ms: Option<u64>,
    reports_received: u32,
    fast_positions_received: u32,
    first_render_pending: bool,
}

impl Extrapolator {
    /// Starts tracking at `initial`, received at `now_ms`. The prediction is
    /// snapped to it.
    pub fn new(config: &ExtrapolationConfig, initial: AircraftVisualState, now_ms: u64) -> Self {
        let initial = initial.normalized();
        Self {
            config: config.clone(),
            visual_state: initial,
            predicted_visual_state: initial,
            positional_velocities: Vector3::zero(),
            rotational_velocities: Vector3::zero(),
            positional_error_velocities: Vector3::zero(),
            rotational_error_velocities: Vector3::zero(),
            error_window: None,
            last_report_ms: now_ms,
            last_velocity_update_ms: None,
            last_slow_position_ms: Some(now_ms),
            reports_received: 1,
            fast_positions_received: 0,
            first_render_pending: true,
        }
    }

    /// Takes in a new report. Returns `false` if it was dropped (non-finite
    /// or older than the last accepted report).
    pub fn apply_report(&mut self, report: &PositionReport) -> bool {
        if !report.state.is_finite() {
            debug!("non-finite position report dropped");
            return false;
        }
        if report.timestamp_ms < self.last_report_ms {
            debug!(
                timestamp_ms = report.timestamp_ms,
                last_report_ms = self.last_report_ms,
                "out-of-order position report dropped"
            );
            return false;
        }

        let next = report.state.normalized();
        let velocities = match report.velocities {
            Some(explicit) => {
                self.fast_positions_received = self.fast_positions_received.saturating_add(1);
                sanitize_velocities(explicit, next.latitude, &self.config).unwrap_or_default()
            }
            None => {
                self.last_slow_position_ms = Some(report.timestamp_ms);
                let delta_ms = report.timestamp_ms as i64 - self.last_report_ms as i64;
                velocities_between(&self.visual_state, &next, delta_ms, &self.config)
            }
        };
        self.positional_velocities = velocities.linear;
        self.rotational_velocities = velocities.angular;
        self.last_velocity_update_ms = Some(report.timestamp_ms);

        self.visual_state = next;
        self.last_report_ms = report.timestamp_ms;
        self.reports_received = self.reports_received.saturating_add(1);

        if self.first_render_pending {
            self.predicted_visual_state = next;
            self.close_error_window();
        } else {
            self.update_error_vectors(report.timestamp_ms, report.is_fast());
        }
        true
    }

    /// Recomputes the error between the new report and the prediction and
    /// opens a fresh correction window.
    fn update_error_vectors(&mut self, now_ms: u64, fast: bool) {
        let predicted = &self.predicted_visual_state;
        let next = &self.visual_state;
        let positional = Vector3::new(
            next.latitude - predicted.latitude,
            normalize_signed(next.longitude - predicted.longitude),
            next.altitude_true - predicted.altitude_true,
        );
        let rotational = Vector3::new(
            normalize_signed(next.pitch - predicted.pitch),
            shortest_angle_delta(predicted.heading, next.heading),
            normalize_signed(next.bank - predicted.bank),
        );

        let horizontal = ground_distance_m(positional.x, positional.y, next.latitude);
        let vertical = feet_to_meters(positional.z);
        let distance = (horizontal * horizontal + vertical * vertical).sqrt();

        let duration_ms = if fast {
            self.config.fast_error_correction_ms
        } else {
            self.config.slow_error_correction_ms
        };

        if duration_ms == 0 || distance > self.config.snap_distance_m {
            debug!(distance, "prediction snapped to report");
            self.predicted_visual_state = *next;
            self.close_error_window();
            return;
        }

        let window = ErrorWindow {
            positional,
            rotational,
            duration_ms,
            until_ms: now_ms.saturating_add(duration_ms),
            applied_to_ms: now_ms,
        };
        (self.positional_error_velocities, self.rotational_error_velocities) =
            window.velocities_at(now_ms);
        self.error_window = Some(window);
        trace!(%positional, %rotational, duration_ms, "error window opened");
    }

    fn close_error_window(&mut self) {
        self.error_window = None;
        self.positional_error_velocities = Vector3::zero();
        self.rotational_error_velocities = Vector3::zero();
    }

    /// Clears the first-render flag, snapping the prediction to the latest
    /// report. Returns whether the flag was set.
    pub fn consume_first_render(&mut self) -> bool {
        if !self.first_render_pending {
            return false;
        }
        self.first_render_pending = false;
        self.predicted_visual_state = self.visual_state;
        self.close_error_window();
        true
    }

    /// Advances the prediction to `now_ms`. Does nothing when
    /// `elapsed_secs` is not a positive finite number.
    pub fn tick(&mut self, now_ms: u64, elapsed_secs: f64) {
        if !(elapsed_secs > 0.0) || !elapsed_secs.is_finite() {
            return;
        }

        let stale = now_ms.saturating_sub(self.last_report_ms) > self.config.max_report_gap_ms;
        let mut next = if stale {
            self.predicted_visual_state
        } else {
            extrapolate(
                &self.predicted_visual_state,
                &ReportedVelocities {
                    linear: self.positional_velocities,
                    angular: self.rotational_velocities,
                },
                elapsed_secs,
            )
        };

        if let Some(window) = self.error_window.as_mut() {
            let t1 = now_ms.min(window.until_ms);
            if t1 > window.applied_to_ms {
                let fraction = window.fraction_through(t1);
                let pos = window.positional * fraction;
                let rot = window.rotational * fraction;
                next.latitude += pos.x;
                next.longitude += pos.y;
                next.altitude_true += pos.z;
                next.pitch += rot.x;
                next.heading += rot.y;
                next.bank += rot.z;
                window.applied_to_ms = t1;
            }
            if now_ms >= window.until_ms {
                self.close_error_window();
            } else {
                (self.positional_error_velocities, self.rotational_error_velocities) =
                    window.velocities_at(now_ms);
            }
        }

        next.nose_wheel_angle = self.visual_state.nose_wheel_angle;
        next.altitude_agl = self
            .visual_state
            .remote_ground_ft()
            .map(|ground| next.altitude_true - ground);
        self.predicted_visual_state = next.normalized();
    }

    pub fn visual_state(&self) -> &AircraftVisualState {
        &self.visual_state
    }

    pub fn predicted_visual_state(&self) -> &AircraftVisualState {
        &self.predicted_visual_state
    }

    /// (lat °/s, lon °/s, ft/s)
    pub fn positional_velocities(&self) -> Vector3 {
        self.positional_velocities
    }

    /// (pitch °/s, heading °/s, bank °/s)
    pub fn rotational_velocities(&self) -> Vector3 {
        self.rotational_velocities
    }

    pub fn positional_error_velocities(&self) -> Vector3 {
        self.positional_error_velocities
    }

    pub fn rotational_error_velocities(&self) -> Vector3 {
        self.rotational_error_velocities
    }

    /// End of the current error-correction window, if one is open.
    pub fn apply_error_velocities_until(&self) -> Option<u64> {
        self.error_window.map(|w| w.until_ms)
    }

    pub fn last_report_ms(&self) -> u64 {
        self.last_report_ms
    }

    pub fn last_velocity_update_ms(&self) -> Option<u64> {
        self.last_velocity_update_ms
    }

    pub fn last_slow_position_ms(&self) -> Option<u64> {
        self.last_slow_position_ms
    }

    pub fn reports_received(&self) -> u32 {
        self.reports_received
    }

    pub fn fast_positions_received(&self) -> u32 {
        self.fast_positions_received
    }

    pub fn is_first_render_pending(&self) -> bool {
        self.first_render_pending
    }
}
