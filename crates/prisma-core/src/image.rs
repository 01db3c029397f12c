//! Pixel buffer representation shared by every engine stage.

use std::fmt;

use crate::error::EngineError;

/// Number of interleaved channels per pixel (R, G, B, A).
pub const CHANNELS: usize = 4;

/// 8-bit RGBA image with interleaved channels.
///
/// Invariant: `pixels.len() == width × height × 4`, and both dimensions
/// are positive. Enforced by every constructor; the fields are private so
/// the invariant cannot be broken afterwards.
#[derive(Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl PixelBuffer {
    /// Wrap an existing RGBA byte vector.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, EngineError> {
        let expected = byte_len(width, height)?;
        if pixels.len() != expected {
            return Err(EngineError::invalid(format!(
                "pixel data has {} bytes, expected {expected} for {width}x{height}",
                pixels.len()
            )));
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// A buffer where every pixel is `rgba`.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Result<Self, EngineError> {
        let len = byte_len(width, height)?;
        let pixels = rgba.iter().copied().cycle().take(len).collect();
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// A fully transparent black buffer.
    pub fn transparent(width: u32, height: u32) -> Result<Self, EngineError> {
        Self::filled(width, height, [0, 0, 0, 0])
    }

    /// Build a buffer from a list of RGBA pixels in row-major order.
    pub fn from_pixels(width: u32, height: u32, pixels: &[[u8; 4]]) -> Result<Self, EngineError> {
        Self::new(width, height, pixels.iter().flatten().copied().collect())
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// `(width, height)` pair.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Number of pixels (`width × height`).
    pub fn pixel_count(&self) -> usize {
        self.pixels.len() / CHANNELS
    }

    /// RGBA value at `(x, y)`. Panics when out of bounds, like slice indexing.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = self.offset(x, y);
        let mut rgba = [0; CHANNELS];
        rgba.copy_from_slice(&self.pixels[i..i + CHANNELS]);
        rgba
    }

    /// Overwrite the RGBA value at `(x, y)`.
    pub fn set_pixel(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        let i = self.offset(x, y);
        self.pixels[i..i + CHANNELS].copy_from_slice(&rgba);
    }

    /// Flat interleaved bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.pixels
    }

    /// Mutable flat bytes. The slice length is fixed, so the size invariant holds.
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    /// Iterate pixels as 4-byte chunks.
    pub fn pixels(&self) -> std::slice::ChunksExact<'_, u8> {
        self.pixels.chunks_exact(CHANNELS)
    }

    /// Iterate pixels mutably as 4-byte chunks.
    pub fn pixels_mut(&mut self) -> std::slice::ChunksExactMut<'_, u8> {
        self.pixels.chunks_exact_mut(CHANNELS)
    }

    /// Whether `other` has the same width and height.
    pub fn same_size(&self, other: &PixelBuffer) -> bool {
        self.dimensions() == other.dimensions()
    }

    /// Consume the buffer and return its bytes.
    pub fn into_raw(self) -> Vec<u8> {
        self.pixels
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        assert!(
            x < self.width && y < self.height,
            "pixel ({x}, {y}) out of bounds"
        );
        (y as usize * self.width as usize + x as usize) * CHANNELS
    }
}

impl fmt::Debug for PixelBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PixelBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.pixels.len())
            .finish()
    }
}

/// Round and clamp a working value back into an 8-bit channel.
#[inline]
pub fn to_channel(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

fn byte_len(width: u32, height: u32) -> Result<usize, EngineError> {
    if width == 0 || height == 0 {
        return Err(EngineError::invalid(format!(
            "dimensions must be positive, got {width}x{height}"
        )));
    }
    let overflow = || EngineError::invalid(format!("{width}x{height} overflows"));
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(CHANNELS))
        .ok_or_else(overflow)
}
