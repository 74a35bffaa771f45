//! Configuration system for Contrail.
//!
//! Tuning for extrapolation, terrain clamping, and flight-model overrides,
//! persisted to disk as RON. Supports CLI overrides via clap and hot-reload
//! detection.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{
    Config, DebugConfig, DemoConfig, ExtrapolationConfig, FlightModelRuleConfig, TerrainConfig,
    default_config_dir,
};
pub use error::ConfigError;
