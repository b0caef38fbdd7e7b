//! Capture settings.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Highest frame rate the scan loop is driven at.
pub const MAX_FPS: u32 = 120;

/// Frames must be tall enough to split into a matrix region and a
/// non-empty lower half for the linear decoder.
pub const MIN_HEIGHT: u32 = 2;

/// Largest accepted width or height in pixels (8K).
pub const MAX_DIMENSION: u32 = 8192;

/// Configuration for camera capture.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Camera index, passed through to the frame source.
    pub device_id: u32,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// One scan tick runs per frame.
    pub fps: u32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            device_id: 0,
            width: 640,
            height: 480,
            fps: 30,
        }
    }
}

impl CaptureConfig {
    /// Returns the default configuration resized to `width` x `height`.
    pub fn with_dimensions(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }

    /// Checks dimensions and frame rate.
    pub fn validate(&self) -> Result<(), CaptureConfigError> {
        let width_ok = (1..=MAX_DIMENSION).contains(&self.width);
        let height_ok = (MIN_HEIGHT..=MAX_DIMENSION).contains(&self.height);
        if !width_ok || !height_ok {
            return Err(CaptureConfigError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }
        if !(1..=MAX_FPS).contains(&self.fps) {
            return Err(CaptureConfigError::InvalidFrameRate(self.fps));
        }
        Ok(())
    }

    /// Time between ticks at the configured frame rate.
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs(1) / self.fps.clamp(1, MAX_FPS)
    }
}

/// Capture settings validation errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CaptureConfigError {
    /// Width or height outside the accepted range.
    #[error(
        "invalid frame size {width}x{height} (need 1..={max} wide, {min}..={max} high)",
        min = MIN_HEIGHT,
        max = MAX_DIMENSION
    )]
    InvalidDimensions {
        /// Configured width.
        width: u32,
        /// Configured height.
        height: u32,
    },
    /// Frame rate outside `1..=MAX_FPS`.
    #[error("invalid frame rate {0} (must be 1-{max})", max = MAX_FPS)]
    InvalidFrameRate(u32),
}
