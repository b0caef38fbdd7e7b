//! Camera input and frame handling.
//!
//! Frames are raw pixel buffers; decoding them into code payloads is the
//! job of the collaborators in [`crate::decode`].

mod camera;
mod config;
mod frame;

pub use camera::{Camera, CameraError, MockCamera};
pub use config::{CaptureConfig, CaptureConfigError, MAX_DIMENSION, MAX_FPS, MIN_HEIGHT};
pub use frame::{Frame, PixelFormat};
