//! Configuration file format.
//!
//! ```toml
//! [capture]
//! width = 1280
//! height = 720
//!
//! [session]
//! mode = "batch"
//! target = 5
//!
//! [keys]
//! fragments = [
//!     { env = "HYBRID_SCAN_FRAGMENT_1" },
//!     { file = "/run/secrets/fragment2" },
//!     { env = "HYBRID_SCAN_FRAGMENT_3" },
//!     { env = "HYBRID_SCAN_FRAGMENT_4" },
//! ]
//!
//! [output]
//! max_frames = 0
//! metrics_port = 9187
//! ```

use crate::capture::{CaptureConfig, CaptureConfigError};
use crate::keys::{FragmentSource, FRAGMENT_COUNT};
use crate::session::ScanMode;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Configuration loading and validation errors.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// The `[capture]` section is out of range.
    #[error(transparent)]
    Capture(#[from] CaptureConfigError),
    /// `[keys]` does not list exactly four fragment sources.
    #[error("expected exactly {count} key fragments, got {0}", count = FRAGMENT_COUNT)]
    FragmentCount(usize),
    /// The file could not be read.
    #[error("failed to read config file: {0}")]
    FileReadError(String),
    /// The file is not valid TOML for this format.
    #[error("failed to parse config file: {0}")]
    ParseError(String),
}

/// Full configuration file format.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ScanConfig {
    /// Camera settings.
    #[serde(default)]
    pub capture: CaptureConfig,
    /// Scan mode and batch target.
    #[serde(default)]
    pub session: SessionConfig,
    /// Master key fragment sources.
    #[serde(default)]
    pub keys: KeyConfig,
    /// Run length and metrics endpoint.
    #[serde(default)]
    pub output: OutputConfig,
}

/// Session defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Single or batch scanning.
    pub mode: ScanMode,
    /// Batch target; 0 scans until stopped.
    pub target: u32,
}

/// Where the master key fragments come from, in slot order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyConfig {
    /// One source per slot, slot 1 first.
    pub fragments: Vec<FragmentSource>,
}

impl Default for KeyConfig {
    fn default() -> Self {
        Self {
            fragments: (1..=FRAGMENT_COUNT)
                .map(|slot| FragmentSource::Env(format!("HYBRID_SCAN_FRAGMENT_{}", slot)))
                .collect(),
        }
    }
}

impl KeyConfig {
    /// Returns the four sources as a fixed-size array.
    pub fn sources(&self) -> Result<[FragmentSource; FRAGMENT_COUNT], ConfigError> {
        self.fragments
            .clone()
            .try_into()
            .map_err(|v: Vec<FragmentSource>| ConfigError::FragmentCount(v.len()))
    }
}

/// Output configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Frames to process before giving up; 0 runs until the session stops.
    pub max_frames: u64,
    /// Metrics server port (0 to disable).
    pub metrics_port: u16,
}

impl OutputConfig {
    /// Returns the frame cap, or `None` to run until the session stops or
    /// the process is interrupted.
    pub fn frame_limit(&self) -> Option<u64> {
        (self.max_frames > 0).then_some(self.max_frames)
    }
}

impl ScanConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileReadError(e.to_string()))?;
        Self::from_toml(&content)
    }

    /// Parses and validates TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: ScanConfig =
            toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the capture section and the fragment count.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.capture.validate()?;
        self.keys.sources()?;
        Ok(())
    }
}
