//! Terrain probing, elevation history, and ground clamping.
//!
//! Remote aircraft report their altitude against the sender's scenery. When
//! the local scenery disagrees, an aircraft taxiing on the remote runway
//! would float above or sink into the local one. This crate samples local
//! elevation, keeps a short history against the remote-implied ground, and
//! converges a vertical offset that keeps the aircraft on the local ground.

pub mod clamp;
pub mod history;
pub mod probe;

pub use clamp::{ClampOutcome, GroundClampController, GroundClampInput};
pub use history::{
    TerrainElevationData, TerrainElevationHistory, TerrainUsability, UnusableReason,
    UsabilityThresholds,
};
pub use probe::{
    FixedTerrainProbe, HeightmapParams, HeightmapTerrainProbe, TerrainProbe, WorldPoint,
};
