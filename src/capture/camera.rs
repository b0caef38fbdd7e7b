//! Frame sources for the scan loop.
//!
//! Frame acquisition is an outside collaborator; the scanner only needs
//! something that hands it one frame per tick.

use super::{CaptureConfig, Frame};
use thiserror::Error;

/// Errors that can occur during camera operations.
#[derive(Debug, Error)]
pub enum CameraError {
    /// The capture settings failed validation.
    #[error("invalid capture settings: {0}")]
    ConfigFailed(String),
    /// One frame was lost; the camera is still usable.
    #[error("frame {sequence} dropped: {reason}")]
    FrameDropped {
        /// Sequence number the frame would have carried.
        sequence: u64,
        /// Backend error text.
        reason: String,
    },
    /// `capture` was called before `open`.
    #[error("camera not open")]
    NotInitialized,
}

/// A source of RGBA frames.
pub trait Camera {
    /// Opens the camera with the given settings.
    fn open(&mut self, config: &CaptureConfig) -> Result<(), CameraError>;

    /// Grabs the next frame. A dropped frame is an error but the camera
    /// stays open.
    fn capture(&mut self) -> Result<Frame, CameraError>;

    /// Returns true between `open` and `close`.
    fn is_open(&self) -> bool;

    /// Releases the device. Safe to call when already closed.
    fn close(&mut self);
}

/// Synthetic camera producing flat grey frames whose shade follows the
/// sequence number.
///
/// Pairs with the scripted decoders, which ignore pixel content.
#[derive(Debug, Default)]
pub struct MockCamera {
    config: Option<CaptureConfig>,
    sequence: u64,
    drop_every: Option<u64>,
}

impl MockCamera {
    /// Creates a closed camera that never drops frames.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every `n`th capture fail, as a flaky USB camera would.
    pub fn dropping_every(n: u64) -> Self {
        Self {
            drop_every: (n > 0).then_some(n),
            ..Self::default()
        }
    }

    /// Frames handed out or dropped since the camera was opened.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}

impl Camera for MockCamera {
    fn open(&mut self, config: &CaptureConfig) -> Result<(), CameraError> {
        config
            .validate()
            .map_err(|e| CameraError::ConfigFailed(e.to_string()))?;
        self.config = Some(config.clone());
        self.sequence = 0;
        tracing::info!(
            device = config.device_id,
            width = config.width,
            height = config.height,
            fps = config.fps,
            "Camera opened"
        );
        Ok(())
    }

    fn capture(&mut self) -> Result<Frame, CameraError> {
        let (width, height) = match &self.config {
            Some(c) => (c.width, c.height),
            None => return Err(CameraError::NotInitialized),
        };
        self.sequence += 1;

        if self.drop_every.is_some_and(|n| self.sequence % n == 0) {
            return Err(CameraError::FrameDropped {
                sequence: self.sequence,
                reason: "simulated transfer error".into(),
            });
        }

        let shade = (self.sequence % 256) as u8;
        let pixels = [shade, shade, shade, u8::MAX].repeat(width as usize * height as usize);
        Ok(Frame::new(pixels, width, height, self.sequence))
    }

    fn is_open(&self) -> bool {
        self.config.is_some()
    }

    fn close(&mut self) {
        if self.config.take().is_some() {
            tracing::info!(frames = self.sequence, "Camera closed");
        }
    }
}
