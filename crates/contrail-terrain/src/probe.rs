//! Local terrain elevation queries.

use contrail_math::{METERS_PER_DEGREE_LAT, meters_per_degree_lon};
use noise::{NoiseFn, Simplex};
use serde::{Deserialize, Serialize};

/// Geodetic latitude/longitude pair in degrees.
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct WorldPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl WorldPoint {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Queries the host simulator's scenery for ground elevation.
///
/// Returns meters above mean sea level, or `None` when the scenery has no
/// answer at this point (not loaded, outside the mesh, query failed).
/// Implementations must not block: the probe runs on the render thread.
pub trait TerrainProbe {
    fn probe(&mut self, point: WorldPoint) -> Option<f64>;
}

impl<F> TerrainProbe for F
where
    F: FnMut(WorldPoint) -> Option<f64>,
{
    fn probe(&mut self, point: WorldPoint) -> Option<f64> {
        self(point)
    }
}

/// Probe returning the same elevation everywhere. Counts its calls.
#[derive(Clone, Debug, Default)]
pub struct FixedTerrainProbe {
    elevation: Option<f64>,
    calls: usize,
}

impl FixedTerrainProbe {
    /// Flat ground at `elevation` meters.
    pub fn new(elevation: f64) -> Self {
        Self {
            elevation: Some(elevation),
            calls: 0,
        }
    }

    /// A probe that never finds ground.
    pub fn unavailable() -> Self {
        Self {
            elevation: None,
            calls: 0,
        }
    }

    /// Change the elevation returned by subsequent probes.
    pub fn set_elevation(&mut self, elevation: Option<f64>) {
        self.elevation = elevation;
    }

    /// Number of probes served so far.
    pub fn calls(&self) -> usize {
        self.calls
    }
}

impl TerrainProbe for FixedTerrainProbe {
    fn probe(&mut self, _point: WorldPoint) -> Option<f64> {
        self.calls += 1;
        self.elevation
    }
}

/// Configuration for the synthetic heightmap scenery.
#[derive(Clone, Debug)]
pub struct HeightmapParams {
    /// Seed for deterministic generation.
    pub seed: u32,
    /// Number of noise octaves to composite.
    pub octaves: u32,
    /// Frequency multiplier between successive octaves.
    pub lacunarity: f64,
    /// Amplitude multiplier between successive octaves.
    pub persistence: f64,
    /// Frequency of the first octave, in cycles per meter.
    pub base_frequency: f64,
    /// Amplitude of the first octave, in meters.
    pub amplitude: f64,
    /// Elevation the noise is centred on, in meters.
    pub base_elevation: f64,
}

impl Default for HeightmapParams {
    fn default() -> Self {
        Self {
            seed: 0,
            octaves: 4,
            lacunarity: 2.0,
            persistence: 0.5,
            base_frequency: 1.0 / 8_000.0,
            amplitude: 40.0,
            base_elevation: 120.0,
        }
    }
}

/// Stand-in scenery: fractal simplex noise over a local metric grid.
///
/// Used where no simulator is attached (the replay demo). Elevations never
/// go below sea level.
pub struct HeightmapTerrainProbe {
    noise: Simplex,
    params: HeightmapParams,
}

impl HeightmapTerrainProbe {
    pub fn new(params: HeightmapParams) -> Self {
        let noise = Simplex::new(params.seed);
        Self { noise, params }
    }

    /// Elevation in meters at the given point.
    pub fn elevation_at(&self, point: WorldPoint) -> f64 {
        let north = point.latitude * METERS_PER_DEGREE_LAT;
        let east = point.longitude * meters_per_degree_lon(point.latitude);

        let mut total = 0.0;
        let mut frequency = self.params.base_frequency;
        let mut amplitude = self.params.amplitude;
        for _ in 0..self.params.octaves {
            total += self.noise.get([east * frequency, north * frequency]) * amplitude;
            frequency *= self.params.lacunarity;
            amplitude *= self.params.persistence;
        }

        (self.params.base_elevation + total).max(0.0)
    }

    pub fn params(&self) -> &HeightmapParams {
        &self.params
    }
}

impl TerrainProbe for HeightmapTerrainProbe {
    fn probe(&mut self, point: WorldPoint) -> Option<f64> {
        Some(self.elevation_at(point))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_probe_counts_calls() {
        let mut probe = FixedTerrainProbe::new(42.0);
        assert_eq!(probe.probe(WorldPoint::new(40.0, -75.0)), Some(42.0));
        assert_eq!(probe.probe(WorldPoint::new(41.0, -75.0)), Some(42.0));
        assert_eq!(probe.calls(), 2);

        probe.set_elevation(None);
        assert_eq!(probe.probe(WorldPoint::default()), None);
    }

    #[test]
    fn test_closure_is_a_probe() {
        let mut probe = |p: WorldPoint| Some(p.latitude * 2.0);
        assert_eq!(probe.probe(WorldPoint::new(3.0, 0.0)), Some(6.0));
    }

    #[test]
    fn test_heightmap_is_deterministic() {
        let a = HeightmapTerrainProbe::new(HeightmapParams {
            seed: 11,
            ..Default::default()
        });
        let b = HeightmapTerrainProbe::new(HeightmapParams {
            seed: 11,
            ..Default::default()
        });
        let p = WorldPoint::new(47.45, -122.31);
        assert_eq!(a.elevation_at(p), b.elevation_at(p));
    }

    #[test]
    fn test_heightmap_stays_within_amplitude() {
        let probe = HeightmapTerrainProbe::new(HeightmapParams::default());
        let params = probe.params().clone();
        let max_amp = params.amplitude * (1.0 + 0.5 + 0.25 + 0.125);
        for i in 0..50 {
            let p = WorldPoint::new(40.0 + i as f64 * 0.01, -75.0 + i as f64 * 0.013);
            let h = probe.elevation_at(p);
            assert!(h >= 0.0);
            assert!(
                (h - params.base_elevation).abs() <= max_amp + 1e-6,
                "elevation {h} outside noise envelope"
            );
        }
    }

    #[test]
    fn test_heightmap_is_smooth_over_short_steps() {
        let mut probe = HeightmapTerrainProbe::new(HeightmapParams::default());
        let a = probe.probe(WorldPoint::new(40.0, -75.0)).unwrap();
        // ~1 m north
        let b = probe.probe(WorldPoint::new(40.000009, -75.0)).unwrap();
        assert!((a - b).abs() < 0.5, "1 m step changed elevation by {}", a - b);
    }
}
