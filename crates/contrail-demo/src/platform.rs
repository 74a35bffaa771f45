//! Where the demo keeps its configuration and logs.

use std::path::{Path, PathBuf};

use crate::error::DemoError;

const APP_NAME: &str = "contrail";

/// OS-specific directories, following XDG on Linux, Known Folders on
/// Windows and Library on macOS.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlatformDirs {
    pub config_dir: PathBuf,
    pub log_dir: PathBuf,
}

impl PlatformDirs {
    /// Resolves the directories without creating them. An explicit
    /// `config_override` replaces the config directory and roots the logs
    /// beside it.
    pub fn resolve(config_override: Option<&Path>) -> Result<Self, DemoError> {
        if let Some(root) = config_override {
            return Ok(Self {
                config_dir: root.to_path_buf(),
                log_dir: root.join("logs"),
            });
        }
        let config_dir = contrail_config::default_config_dir().map_err(|_| DemoError::NoConfigDir)?;
        let log_dir = dirs::data_local_dir()
            .map(|base| base.join(APP_NAME).join("logs"))
            .unwrap_or_else(|| config_dir.join("logs"));
        Ok(Self {
            config_dir,
            log_dir,
        })
    }

    /// Creates both directories on disk.
    pub fn create_dirs(&self) -> Result<(), DemoError> {
        std::fs::create_dir_all(&self.config_dir)?;
        std::fs::create_dir_all(&self.log_dir)?;
        Ok(())
    }
}
