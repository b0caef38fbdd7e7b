//! Frame type representing a captured image with metadata.

use std::time::Instant;

/// Pixel layout of a frame buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// One luma byte per pixel.
    Gray8,
    /// Four bytes per pixel, red/green/blue/alpha.
    Rgba8,
}

impl PixelFormat {
    /// Bytes used by a single pixel.
    #[inline]
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Gray8 => 1,
            PixelFormat::Rgba8 => 4,
        }
    }
}

/// A single captured frame from the camera.
///
/// The matrix decoder sees a grayscale copy of the whole frame, the
/// linear decoder sees the lower half in full colour.
#[derive(Clone)]
pub struct Frame {
    /// Raw pixel data laid out according to `format`.
    pixels: Vec<u8>,
    /// Frame width in pixels.
    width: u32,
    /// Frame height in pixels.
    height: u32,
    format: PixelFormat,
    /// Capture timestamp.
    timestamp: Instant,
    /// Monotonic sequence number.
    sequence: u64,
}

impl Frame {
    /// Creates a new RGBA frame.
    pub fn new(pixels: Vec<u8>, width: u32, height: u32, sequence: u64) -> Self {
        Self::with_format(pixels, width, height, PixelFormat::Rgba8, sequence)
    }

    /// Creates a frame with an explicit pixel layout.
    pub fn with_format(
        pixels: Vec<u8>,
        width: u32,
        height: u32,
        format: PixelFormat,
        sequence: u64,
    ) -> Self {
        Self {
            pixels,
            width,
            height,
            format,
            timestamp: Instant::now(),
            sequence,
        }
    }

    /// Returns a reference to the raw pixel data.
    #[inline]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Returns the frame width.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns the frame height.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns the pixel layout.
    #[inline]
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Returns the capture timestamp.
    #[inline]
    pub fn timestamp(&self) -> Instant {
        self.timestamp
    }

    /// Returns the sequence number.
    #[inline]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Returns the total number of pixels (width * height).
    #[inline]
    pub fn pixel_count(&self) -> usize {
        (self.width as usize) * (self.height as usize)
    }

    /// Validates that the pixel buffer size matches dimensions and layout.
    pub fn is_valid(&self) -> bool {
        self.pixels.len() == self.pixel_count() * self.format.bytes_per_pixel()
    }

    /// Returns a grayscale copy using ITU-R BT.601 luma weights.
    ///
    /// Gray8 frames are returned unchanged.
    pub fn to_grayscale(&self) -> Frame {
        let pixels = match self.format {
            PixelFormat::Gray8 => self.pixels.clone(),
            PixelFormat::Rgba8 => self
                .pixels
                .chunks_exact(4)
                .map(|px| {
                    let luma = 0.299 * f64::from(px[0])
                        + 0.587 * f64::from(px[1])
                        + 0.114 * f64::from(px[2]);
                    luma.round().min(255.0) as u8
                })
                .collect(),
        };

        Frame {
            pixels,
            width: self.width,
            height: self.height,
            format: PixelFormat::Gray8,
            timestamp: self.timestamp,
            sequence: self.sequence,
        }
    }

    /// Returns the lower half of the frame, keeping the pixel layout.
    ///
    /// For odd heights the middle row belongs to the lower half.
    pub fn lower_half(&self) -> Frame {
        let top = (self.height / 2) as usize;
        let row_bytes = self.width as usize * self.format.bytes_per_pixel();
        let start = (top * row_bytes).min(self.pixels.len());

        Frame {
            pixels: self.pixels[start..].to_vec(),
            width: self.width,
            height: self.height - top as u32,
            format: self.format,
            timestamp: self.timestamp,
            sequence: self.sequence,
        }
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("format", &self.format)
            .field("sequence", &self.sequence)
            .field("pixel_bytes", &self.pixels.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_creation() {
        let pixels = vec![0u8; 64 * 48 * 4];
        let frame = Frame::new(pixels, 64, 48, 1);

        assert_eq!(frame.width(), 64);
        assert_eq!(frame.height(), 48);
        assert_eq!(frame.sequence(), 1);
        assert_eq!(frame.format(), PixelFormat::Rgba8);
        assert!(frame.is_valid());
    }

    #[test]
    fn test_frame_invalid_size() {
        let pixels = vec![0u8; 100]; // Wrong size
        let frame = Frame::new(pixels, 64, 48, 1);

        assert!(!frame.is_valid());
    }

    #[test]
    fn test_grayscale_weights() {
        let pixels = vec![
            255, 0, 0, 255, // red
            0, 255, 0, 255, // green
            0, 0, 255, 255, // blue
            255, 255, 255, 255, // white
        ];
        let gray = Frame::new(pixels, 2, 2, 7).to_grayscale();

        assert_eq!(gray.format(), PixelFormat::Gray8);
        assert_eq!(gray.pixels(), &[76, 150, 29, 255]);
        assert_eq!(gray.sequence(), 7);
        assert!(gray.is_valid());
    }

    #[test]
    fn test_lower_half_odd_height() {
        let pixels: Vec<u8> = (0..15).collect();
        let frame = Frame::with_format(pixels, 5, 3, PixelFormat::Gray8, 1);

        let lower = frame.lower_half();
        assert_eq!(lower.height(), 2);
        assert_eq!(lower.pixels(), &[5, 6, 7, 8, 9, 10, 11, 12, 13, 14]);
        assert!(lower.is_valid());
    }
}
