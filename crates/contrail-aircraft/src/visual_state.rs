//! Snapshot types exchanged between the network side and the render side.

use contrail_math::{Vector3, normalize_heading, normalize_signed};
use contrail_terrain::WorldPoint;
use serde::{Deserialize, Serialize};

/// Position and attitude of an aircraft at one instant.
///
/// Altitudes are feet; angles are degrees. Heading lives in `[0, 360)`,
/// pitch and bank in `(-180, 180]`.
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct AircraftVisualState {
    pub latitude: f64,
    pub longitude: f64,
    /// True altitude above mean sea level (ft).
    pub altitude_true: f64,
    /// Height above the remote pilot's ground (ft), when reported.
    pub altitude_agl: Option<f64>,
    pub pitch: f64,
    pub heading: f64,
    pub bank: f64,
    /// Nose wheel steering angle (deg).
    pub nose_wheel_angle: f64,
}

impl AircraftVisualState {
    pub fn location(&self) -> WorldPoint {
        WorldPoint::new(self.latitude, self.longitude)
    }

    /// Brings every angle back into its canonical range.
    pub fn normalized(mut self) -> Self {
        self.heading = normalize_heading(self.heading);
        self.pitch = normalize_signed(self.pitch);
        self.bank = normalize_signed(self.bank);
        self.longitude = normalize_signed(self.longitude);
        self.latitude = self.latitude.clamp(-90.0, 90.0);
        self
    }

    /// Every numeric field is finite.
    pub fn is_finite(&self) -> bool {
        [
            self.latitude,
            self.longitude,
            self.altitude_true,
            self.pitch,
            self.heading,
            self.bank,
            self.nose_wheel_angle,
        ]
        .iter()
        .all(|v| v.is_finite())
            && self.altitude_agl.is_none_or(f64::is_finite)
    }

    /// Elevation of the remote ground under this state (ft), if AGL is known.
    pub fn remote_ground_ft(&self) -> Option<f64> {
        self.altitude_agl.map(|agl| self.altitude_true - agl)
    }
}

/// Velocities a report may carry explicitly.
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct ReportedVelocities {
    /// (lat °/s, lon °/s, altitude ft/s)
    pub linear: Vector3,
    /// (pitch °/s, heading °/s, bank °/s)
    pub angular: Vector3,
}

/// One position update from the network.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PositionReport {
    /// Monotonic receive time (ms).
    pub timestamp_ms: u64,
    pub state: AircraftVisualState,
    /// Ground speed in knots, when the sender includes it.
    pub ground_speed: Option<f64>,
    pub on_ground: bool,
    /// Present on high-rate ("fast") updates.
    pub velocities: Option<ReportedVelocities>,
}

impl PositionReport {
    /// A plain position report without explicit velocities.
    pub fn slow(timestamp_ms: u64, state: AircraftVisualState) -> Self {
        Self {
            timestamp_ms,
            state,
            ground_speed: None,
            on_ground: false,
            velocities: None,
        }
    }

    /// A high-rate report carrying its own velocities.
    pub fn fast(
        timestamp_ms: u64,
        state: AircraftVisualState,
        velocities: ReportedVelocities,
    ) -> Self {
        Self {
            velocities: Some(velocities),
            ..Self::slow(timestamp_ms, state)
        }
    }

    pub fn is_fast(&self) -> bool {
        self.velocities.is_some()
    }
}

/// Render-thread timing for one frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameTick {
    /// Monotonic milliseconds at the start of the frame.
    pub now_ms: u64,
    /// Seconds since the previous frame.
    pub elapsed_secs: f64,
    pub frame_rate: f32,
}

impl FrameTick {
    pub fn new(now_ms: u64, elapsed_secs: f64, frame_rate: f32) -> Self {
        Self {
            now_ms,
            elapsed_secs,
            frame_rate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_wraps_angles() {
        let state = AircraftVisualState {
            heading: 370.0,
            bank: 190.0,
            pitch: -185.0,
            longitude: 181.0,
            ..Default::default()
        }
        .normalized();
        assert!((state.heading - 10.0).abs() < 1e-9);
        assert!((state.bank + 170.0).abs() < 1e-9);
        assert!((state.pitch - 175.0).abs() < 1e-9);
        assert!((state.longitude + 179.0).abs() < 1e-9);
    }

    #[test]
    fn test_remote_ground() {
        let state = AircraftVisualState {
            altitude_true: 1_500.0,
            altitude_agl: Some(400.0),
            ..Default::default()
        };
        assert_eq!(state.remote_ground_ft(), Some(1_100.0));
        assert_eq!(AircraftVisualState::default().remote_ground_ft(), None);
    }

    #[test]
    fn test_non_finite_detected() {
        let mut state = AircraftVisualState::default();
        assert!(state.is_finite());
        state.altitude_agl = Some(f64::NAN);
        assert!(!state.is_finite());
    }

    #[test]
    fn test_report_kinds() {
        let state = AircraftVisualState::default();
        assert!(!PositionReport::slow(0, state).is_fast());
        assert!(PositionReport::fast(0, state, ReportedVelocities::default()).is_fast());
    }
}
