//! Bulk state export for observers outside the render loop.
//!
//! Each aircraft publishes its numeric [`BulkData`] at the end of every
//! update and its [`BulkInfoTexts`] only when they change. Readers get a
//! [`BulkSnapshot`] assembled from the last commit of both and never see
//! one that is half written. For observers in another process the snapshot
//! is encoded with postcard.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use contrail_math::Vector3;
use serde::{Deserialize, Serialize};

/// Current encoded format version.
pub const BULK_FORMAT_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// Numeric state of one aircraft.
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct BulkData {
    /// Stable per-aircraft key (the Mode S id).
    pub key: u32,
    pub latitude: f64,
    pub longitude: f64,
    /// Extrapolated true altitude (ft).
    pub altitude_true: f64,
    /// Terrain-adjusted altitude (ft), once clamping has decided.
    pub altitude_adjusted: Option<f64>,
    pub altitude_agl: Option<f64>,
    pub pitch: f64,
    pub heading: f64,
    pub bank: f64,
    pub nose_wheel_angle: f64,
    pub positional_velocities: Vector3,
    pub rotational_velocities: Vector3,
    /// Knots.
    pub ground_speed: f64,
    pub on_ground: bool,
    pub gear: f64,
    pub flaps: f64,
    pub spoilers: f64,
    pub reverser: f64,
    pub gear_down: bool,
    pub spoilers_deployed: bool,
    pub engines_running: bool,
    pub engines_reversing: bool,
    /// Vertical ground-clamp offset currently applied (m).
    pub terrain_offset: f64,
}

/// Descriptive text of one aircraft.
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BulkInfoTexts {
    pub key: u32,
    pub callsign: String,
    pub icao_type: String,
    pub icao_airline: String,
    pub livery: String,
    pub model_name: String,
    pub origin: String,
    pub destination: String,
}

/// One committed export.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BulkSnapshot {
    pub version: u32,
    /// Monotonic milliseconds of the update that produced it.
    pub timestamp_ms: u64,
    pub data: BulkData,
    pub info: BulkInfoTexts,
}

impl BulkSnapshot {
    pub fn new(timestamp_ms: u64, data: BulkData, info: BulkInfoTexts) -> Self {
        Self {
            version: BULK_FORMAT_VERSION,
            timestamp_ms,
            data,
            info,
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors encoding or decoding an export.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("bulk format version {found} is newer than max supported {max_supported}")]
    VersionTooNew { found: u32, max_supported: u32 },
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Encodes `snapshot` for another process.
pub fn encode(snapshot: &BulkSnapshot) -> Result<Vec<u8>, ExportError> {
    postcard::to_allocvec(snapshot).map_err(|e| ExportError::Serialization(e.to_string()))
}

/// Decodes bytes produced by [`encode`].
pub fn decode(bytes: &[u8]) -> Result<BulkSnapshot, ExportError> {
    let snapshot: BulkSnapshot =
        postcard::from_bytes(bytes).map_err(|e| ExportError::Serialization(e.to_string()))?;
    if snapshot.version > BULK_FORMAT_VERSION {
        return Err(ExportError::VersionTooNew {
            found: snapshot.version,
            max_supported: BULK_FORMAT_VERSION,
        });
    }
    Ok(snapshot)
}

// ---------------------------------------------------------------------------
// Shared slot
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct Slot {
    timestamp_ms: u64,
    data: Option<BulkData>,
    info: Option<BulkInfoTexts>,
    info_revision: u64,
}

/// Latest export of one aircraft, shared between threads.
#[derive(Clone, Debug, Default)]
pub struct SharedBulkData {
    inner: Arc<Mutex<Slot>>,
}

impl SharedBulkData {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self) -> MutexGuard<'_, Slot> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replaces both halves of the committed snapshot.
    pub fn publish(&self, snapshot: BulkSnapshot) {
        let mut slot = self.slot();
        slot.timestamp_ms = snapshot.timestamp_ms;
        slot.data = Some(snapshot.data);
        slot.info = Some(snapshot.info);
        slot.info_revision += 1;
    }

    /// Replaces the numeric state. Called every frame.
    pub fn publish_data(&self, timestamp_ms: u64, data: BulkData) {
        let mut slot = self.slot();
        slot.timestamp_ms = timestamp_ms;
        slot.data = Some(data);
    }

    /// Replaces the info texts. Called when they change.
    pub fn publish_info(&self, info: BulkInfoTexts) {
        let mut slot = self.slot();
        slot.info = Some(info);
        slot.info_revision += 1;
    }

    /// Number of info text commits so far.
    pub fn info_revision(&self) -> u64 {
        self.slot().info_revision
    }

    /// The last committed snapshot, once both halves have been published.
    pub fn latest(&self) -> Option<BulkSnapshot> {
        let slot = self.slot();
        match (&slot.data, &slot.info) {
            (Some(data), Some(info)) => {
                Some(BulkSnapshot::new(slot.timestamp_ms, data.clone(), info.clone()))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(timestamp_ms: u64) -> BulkSnapshot {
        BulkSnapshot::new(
            timestamp_ms,
            BulkData {
                key: 0xA1B2C3,
                latitude: 47.45,
                longitude: -122.31,
                altitude_true: 432.0,
                altitude_adjusted: Some(430.5),
                gear: 1.0,
                gear_down: true,
                ..Default::default()
            },
            BulkInfoTexts {
                key: 0xA1B2C3,
                callsign: "ASA123".to_string(),
                icao_type: "B738".to_string(),
                origin: "KSEA".to_string(),
                destination: "KSFO".to_string(),
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_encoded_snapshot_decodes() {
        let original = snapshot(1_000);
        let bytes = encode(&original).unwrap();
        assert_eq!(decode(&bytes).unwrap(), original);
    }

    #[test]
    fn test_newer_version_rejected() {
        let mut future = snapshot(0);
        future.version = BULK_FORMAT_VERSION + 1;
        let bytes = encode(&future).unwrap();
        assert!(matches!(
            decode(&bytes),
            Err(ExportError::VersionTooNew { found, .. }) if found == BULK_FORMAT_VERSION + 1
        ));
    }

    #[test]
    fn test_truncated_bytes_rejected() {
        let bytes = encode(&snapshot(0)).unwrap();
        assert!(matches!(
            decode(&bytes[..bytes.len() / 2]),
            Err(ExportError::Serialization(_))
        ));
    }

    #[test]
    fn test_info_texts_json_shape() {
        let json = serde_json::to_value(&snapshot(0).info).unwrap();
        assert_eq!(json["callsign"], "ASA123");
        assert_eq!(json["destination"], "KSFO");
    }

    #[test]
    fn test_shared_slot_visible_across_threads() {
        let shared = SharedBulkData::new();
        assert!(shared.latest().is_none());

        let writer = shared.clone();
        std::thread::spawn(move || {
            for t in 0..10 {
                writer.publish(snapshot(t));
            }
        })
        .join()
        .unwrap();

        let latest = shared.latest().unwrap();
        assert_eq!(latest.timestamp_ms, 9);
        assert_eq!(latest.info.callsign, "ASA123");
    }

    #[test]
    fn test_snapshot_needs_both_halves() {
        let shared = SharedBulkData::new();
        let full = snapshot(5);
        shared.publish_data(5, full.data.clone());
        assert!(shared.latest().is_none());

        shared.publish_info(full.info.clone());
        assert_eq!(shared.latest(), Some(full.clone()));

        shared.publish_data(6, full.data.clone());
        assert_eq!(shared.latest().unwrap().timestamp_ms, 6);
        assert_eq!(shared.info_revision(), 1);
    }
}
