//! Bounded, time-ordered record of local vs. remote ground elevation.
//!
//! Each sample pairs what the local scenery says the ground is with what the
//! remote pilot's report implies the ground is (true altitude minus AGL) at
//! the same spot. Clamping only trusts the difference while the samples are
//! fresh, the aircraft is close to the ground, and the local ground under the
//! recent track is flat enough that the difference is meaningful.

use std::collections::VecDeque;

use contrail_config::TerrainConfig;

use crate::probe::WorldPoint;

/// One probe sample.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TerrainElevationData {
    /// Monotonic milliseconds at which the probe ran.
    pub timestamp_ms: u64,
    /// Where the probe ran.
    pub location: WorldPoint,
    /// Ground elevation implied by the remote report (m).
    pub remote_value: f64,
    /// Ground elevation from the local scenery (m).
    pub local_value: f64,
}

impl TerrainElevationData {
    /// `local - remote`: how far the local ground sits above the remote one.
    pub fn offset(&self) -> f64 {
        self.local_value - self.remote_value
    }
}

/// The three limits that must all hold for terrain data to be usable.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UsabilityThresholds {
    /// Newest sample must be strictly younger than this (ms).
    pub usable_age_ms: u64,
    /// Reported AGL must be strictly below this (m).
    pub max_altitude_agl_m: f64,
    /// Local elevation change between consecutive samples must stay strictly
    /// below this (m per sampling interval).
    pub max_slope_m: f64,
}

impl Default for UsabilityThresholds {
    fn default() -> Self {
        Self::from(&TerrainConfig::default())
    }
}

impl From<&TerrainConfig> for UsabilityThresholds {
    fn from(config: &TerrainConfig) -> Self {
        Self {
            usable_age_ms: config.usable_age_ms,
            max_altitude_agl_m: config.max_altitude_agl_m,
            max_slope_m: config.max_slope_m,
        }
    }
}

/// Why terrain data was rejected, first failing condition wins.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnusableReason {
    NoSamples,
    Stale,
    AltitudeAglUnknown,
    TooHighAboveGround,
    SlopeTooSteep,
}

/// Result of one usability evaluation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TerrainUsability {
    pub usable: bool,
    pub reason: Option<UnusableReason>,
    /// Age of the newest sample, if any.
    pub newest_age_ms: Option<u64>,
    /// Largest local elevation change between consecutive samples inside
    /// the usable-age window (m per sampling interval).
    pub slope_m: f64,
    /// Mean `local − remote` inside the window; the clamp target.
    pub mean_offset_m: Option<f64>,
}

/// Fixed-capacity ring buffer of [`TerrainElevationData`], oldest first.
#[derive(Clone, Debug)]
pub struct TerrainElevationHistory {
    entries: VecDeque<TerrainElevationData>,
    capacity: usize,
    usable_age_ms: u64,
    has_usable_data: bool,
}

impl TerrainElevationHistory {
    /// Creates an empty history holding at most `capacity` samples and
    /// evicting samples older than `usable_age_ms`.
    pub fn new(capacity: usize, usable_age_ms: u64) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            usable_age_ms,
            has_usable_data: false,
        }
    }

    /// Appends a sample. Returns `false` (and drops the sample) if it is
    /// older than the newest entry.
    pub fn push(&mut self, entry: TerrainElevationData) -> bool {
        if self
            .entries
            .back()
            .is_some_and(|newest| entry.timestamp_ms < newest.timestamp_ms)
        {
            return false;
        }
        self.prune(entry.timestamp_ms);
        if self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
        true
    }

    /// Drops every sample that has reached the usable age at `now_ms`.
    pub fn prune(&mut self, now_ms: u64) {
        while self
            .entries
            .front()
            .is_some_and(|e| now_ms.saturating_sub(e.timestamp_ms) >= self.usable_age_ms)
        {
            self.entries.pop_front();
        }
    }

    /// Recomputes usability at `now_ms` for an aircraft reporting
    /// `altitude_agl_m` and stores the result in [`has_usable_data`].
    ///
    /// [`has_usable_data`]: Self::has_usable_data
    pub fn evaluate(
        &mut self,
        now_ms: u64,
        altitude_agl_m: Option<f64>,
        thresholds: &UsabilityThresholds,
    ) -> TerrainUsability {
        let newest_age_ms = self
            .entries
            .back()
            .map(|e| now_ms.saturating_sub(e.timestamp_ms));

        let mut slope_m: f64 = 0.0;
        let mut previous_local: Option<f64> = None;
        let mut offset_sum = 0.0;
        let mut count = 0usize;
        for entry in self
            .entries
            .iter()
            .filter(|e| now_ms.saturating_sub(e.timestamp_ms) < thresholds.usable_age_ms)
        {
            if let Some(previous) = previous_local {
                slope_m = slope_m.max((entry.local_value - previous).abs());
            }
            previous_local = Some(entry.local_value);
            offset_sum += entry.offset();
            count += 1;
        }
        let mean_offset_m = (count > 0).then(|| offset_sum / count as f64);

        let reason = match (newest_age_ms, altitude_agl_m) {
            (None, _) => Some(UnusableReason::NoSamples),
            (Some(age), _) if age >= thresholds.usable_age_ms => Some(UnusableReason::Stale),
            (_, None) => Some(UnusableReason::AltitudeAglUnknown),
            (_, Some(agl)) if !(agl < thresholds.max_altitude_agl_m) => {
                Some(UnusableReason::TooHighAboveGround)
            }
            _ if !(slope_m < thresholds.max_slope_m) => Some(UnusableReason::SlopeTooSteep),
            _ => None,
        };

        self.has_usable_data = reason.is_none();
        TerrainUsability {
            usable: self.has_usable_data,
            reason,
            newest_age_ms,
            slope_m,
            mean_offset_m,
        }
    }

    /// Result of the last [`evaluate`](Self::evaluate); `false` before the first.
    pub fn has_usable_data(&self) -> bool {
        self.has_usable_data
    }

    pub fn newest(&self) -> Option<&TerrainElevationData> {
        self.entries.back()
    }

    pub fn entries(&self) -> &VecDeque<TerrainElevationData> {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
