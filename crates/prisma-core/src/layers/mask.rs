//! Single-channel layer masks.

use serde::{Deserialize, Serialize};

use crate::color_management::luma_u8;
use crate::error::EngineError;
use crate::image::PixelBuffer;

/// Per-pixel alpha multiplier for a layer.
///
/// `255` keeps the layer fully, `0` hides it. With `inverted` set the
/// meaning flips.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawMask")]
pub struct Mask {
    width: u32,
    height: u32,
    values: Vec<u8>,
    inverted: bool,
}

#[derive(Deserialize)]
struct RawMask {
    width: u32,
    height: u32,
    values: Vec<u8>,
    #[serde(default)]
    inverted: bool,
}

impl TryFrom<RawMask> for Mask {
    type Error = EngineError;

    fn try_from(raw: RawMask) -> Result<Self, Self::Error> {
        let mask = Self::new(raw.width, raw.height, raw.values)?;
        Ok(mask.inverted(raw.inverted))
    }
}

impl Mask {
    pub fn new(width: u32, height: u32, values: Vec<u8>) -> Result<Self, EngineError> {
        if width == 0 || height == 0 {
            return Err(EngineError::invalid(format!(
                "mask dimensions must be positive, got {width}x{height}"
            )));
        }
        let expected = width as usize * height as usize;
        if values.len() != expected {
            return Err(EngineError::invalid(format!(
                "mask has {} values, expected {expected} for {width}x{height}",
                values.len()
            )));
        }
        Ok(Self {
            width,
            height,
            values,
            inverted: false,
        })
    }

    /// Uniform mask.
    pub fn filled(width: u32, height: u32, value: u8) -> Result<Self, EngineError> {
        Self::new(width, height, vec![value; width as usize * height as usize])
    }

    /// Mask from the Rec. 601 luminance of an RGBA buffer.
    pub fn from_buffer(buffer: &PixelBuffer) -> Self {
        let values = buffer
            .pixels()
            .map(|px| luma_u8(px[0], px[1], px[2]))
            .collect();
        Self {
            width: buffer.width(),
            height: buffer.height(),
            values,
            inverted: false,
        }
    }

    pub fn inverted(mut self, inverted: bool) -> Self {
        self.inverted = inverted;
        self
    }

    pub fn set_inverted(&mut self, inverted: bool) {
        self.inverted = inverted;
    }

    pub fn is_inverted(&self) -> bool {
        self.inverted
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn values(&self) -> &[u8] {
        &self.values
    }

    /// Multiplier in `[0, 1]` for the pixel at flat index `i`, inversion applied.
    #[inline]
    pub fn factor(&self, i: usize) -> f32 {
        let v = self.values[i] as f32 / 255.0;
        if self.inverted { 1.0 - v } else { v }
    }
}
