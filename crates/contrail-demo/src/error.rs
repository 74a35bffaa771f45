use contrail_aircraft::{ExportError, FlightModelError};
use contrail_config::ConfigError;

/// Errors that stop the replay before or while it starts.
#[derive(Debug, thiserror::Error)]
pub enum DemoError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("flight model table: {0}")]
    FlightModels(#[from] FlightModelError),
    #[error("could not determine OS configuration directory")]
    NoConfigDir,
    #[error("bulk export: {0}")]
    Export(#[from] ExportError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("network feeder thread panicked")]
    FeederPanicked,
}
