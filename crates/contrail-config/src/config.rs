//! Configuration structs with sensible defaults and RON persistence.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const APP_NAME: &str = "contrail";

/// Top-level tracking configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Dead-reckoning and error-correction settings.
    pub extrapolation: ExtrapolationConfig,
    /// Terrain probing and ground clamping settings.
    pub terrain: TerrainConfig,
    /// Flight-model rules replacing the built-in table when non-empty.
    pub flight_models: Vec<FlightModelRuleConfig>,
    /// Scripted replay settings for the demo binary.
    pub demo: DemoConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// Dead-reckoning configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExtrapolationConfig {
    /// Error-correction window after a report carrying explicit velocities (ms).
    pub fast_error_correction_ms: u64,
    /// Error-correction window after a plain position report (ms).
    pub slow_error_correction_ms: u64,
    /// Reports further apart than this produce zero velocity (ms).
    pub max_report_gap_ms: u64,
    /// Implied ground speeds above this are discarded as glitches (m/s).
    pub max_ground_speed_mps: f64,
    /// Corrections farther than this are applied at once instead of blended (m).
    pub snap_distance_m: f64,
}

/// Terrain probing and ground clamping configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TerrainConfig {
    /// Newest history sample must be younger than this (ms).
    pub usable_age_ms: u64,
    /// Reported height above ground must be below this (m).
    pub max_altitude_agl_m: f64,
    /// Local elevation change per sampling interval must be below this (m).
    pub max_slope_m: f64,
    /// Maximum number of retained elevation samples.
    pub history_capacity: usize,
    /// Minimum time between two probes of the same aircraft (ms).
    pub probe_interval_ms: u64,
    /// Below this frame rate the probe interval is doubled.
    pub low_frame_rate: f32,
    /// Time over which a new offset is blended in (s).
    pub offset_transition_secs: f64,
    /// Slowest offset convergence rate (m/s).
    pub min_offset_rate_mps: f64,
    /// Fastest offset convergence rate (m/s).
    pub max_offset_rate_mps: f64,
    /// Offset is considered settled within this distance of the target (m).
    pub offset_tolerance_m: f64,
}

/// One ordered flight-model rule: a regex over the model key and the
/// constants it selects.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FlightModelRuleConfig {
    /// Regex matched against `"{classification};{wtc};{icao_type}"`.
    pub pattern: String,
    /// Category name reported for diagnostics.
    pub category: String,
    /// Gear up/down time (ms).
    pub gear_duration_ms: f64,
    /// Main gear compression on touchdown (m).
    pub gear_deflection_m: f64,
    /// Flaps 0 → 100% time (ms).
    pub flaps_duration_ms: f64,
    /// Spoiler extension time (ms).
    pub spoiler_duration_ms: f64,
    /// Thrust reverser deployment time (ms).
    pub reverser_duration_ms: f64,
    /// One of `Helicopter`, `PistonProp`, `TurboProp`, `JetEngine`, `Unknown`.
    pub engine_class: String,
}

/// Demo replay configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DemoConfig {
    /// Render ticks per second.
    pub frame_rate: u32,
    /// Length of the replayed flight (s).
    pub duration_secs: u32,
    /// Interval between scripted position reports (ms).
    pub report_interval_ms: u64,
    /// Seed for the synthetic terrain.
    pub terrain_seed: u32,
    /// Pace frames and reports by the wall clock.
    pub realtime: bool,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
    /// Write JSON log files next to the console output.
    pub file_logging: bool,
}

// --- Default implementations ---

impl Default for ExtrapolationConfig {
    fn default() -> Self {
        Self {
            fast_error_correction_ms: 2_000,
            slow_error_correction_ms: 5_000,
            max_report_gap_ms: 10_000,
            max_ground_speed_mps: 600.0,
            snap_distance_m: 1_000.0,
        }
    }
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            usable_age_ms: 2_000,
            max_altitude_agl_m: 100.0,
            max_slope_m: 3.0,
            history_capacity: 32,
            probe_interval_ms: 250,
            low_frame_rate: 20.0,
            offset_transition_secs: 2.0,
            min_offset_rate_mps: 0.05,
            max_offset_rate_mps: 5.0,
            offset_tolerance_m: 0.01,
        }
    }
}

impl Default for FlightModelRuleConfig {
    fn default() -> Self {
        Self {
            pattern: ".*".to_string(),
            category: "Unknown".to_string(),
            gear_duration_ms: 10_000.0,
            gear_deflection_m: 0.5,
            flaps_duration_ms: 5_000.0,
            spoiler_duration_ms: 1_000.0,
            reverser_duration_ms: 1_500.0,
            engine_class: "Unknown".to_string(),
        }
    }
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            frame_rate: 60,
            duration_secs: 30,
            report_interval_ms: 200,
            terrain_seed: 7,
            realtime: true,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            file_logging: false,
        }
    }
}

/// Platform-specific configuration directory (`<config>/contrail`).
///
/// # Errors
///
/// Returns [`ConfigError::NoConfigDir`] if the OS does not expose one.
pub fn default_config_dir() -> Result<PathBuf, ConfigError> {
    let base = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
    Ok(base.join(APP_NAME))
}

// --- Load / Save / Reload ---

impl Config {
    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join("config.ron");

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
            let config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(ConfigError::WriteError)?;

        let config_path = config_dir.join("config.ron");
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(true)
            .enumerate_arrays(false);

        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;

        std::fs::write(&config_path, serialized).map_err(ConfigError::WriteError)?;
        Ok(())
    }

    /// Hot-reload: returns `Some(new_config)` if the file changed, `None` otherwise.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let config_path = config_dir.join("config.ron");
        let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
        let new_config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;

        if &new_config != self {
            log::info!("Config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }
}
