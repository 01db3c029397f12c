//! Shadows / midtones / highlights color balance.
//!
//! Each tonal zone carries an RGB offset in `[-100, 100]`. A pixel's luma
//! `Y` selects how much of each zone applies:
//!
//! ```text
//! Y < 85          shadows    w = 1 − Y / 85
//! 85 ≤ Y ≤ 170    midtones   w = max(0, 1 − |Y − 127.5| / 42.5)
//! Y > 170         highlights w = (Y − 170) / 85
//! out = in + offset × w
//! ```

use serde::{Deserialize, Serialize};

use crate::color_management::luma;
use crate::image::{PixelBuffer, to_channel};

const SHADOW_CEILING: f32 = 85.0;
const HIGHLIGHT_FLOOR: f32 = 170.0;
const MIDTONE_CENTER: f32 = 127.5;
const MIDTONE_HALF_WIDTH: f32 = 42.5;

/// Per-zone RGB offsets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorBalance {
    pub shadows: [f32; 3],
    pub midtones: [f32; 3],
    pub highlights: [f32; 3],
}

impl ColorBalance {
    /// Whether every offset is zero.
    pub fn is_identity(&self) -> bool {
        [self.shadows, self.midtones, self.highlights]
            .iter()
            .flatten()
            .all(|&v| v == 0.0)
    }

    /// Clamp every offset into `[-100, 100]` and zero non-finite values.
    pub fn clamped(self) -> Self {
        Self {
            shadows: self.shadows.map(clamp_offset),
            midtones: self.midtones.map(clamp_offset),
            highlights: self.highlights.map(clamp_offset),
        }
    }

    fn offset_for(&self, y: f32) -> Option<([f32; 3], f32)> {
        if y < SHADOW_CEILING {
            Some((self.shadows, 1.0 - y / SHADOW_CEILING))
        } else if y > HIGHLIGHT_FLOOR {
            Some((self.highlights, (y - HIGHLIGHT_FLOOR) / SHADOW_CEILING))
        } else {
            let w = 1.0 - (y - MIDTONE_CENTER).abs() / MIDTONE_HALF_WIDTH;
            (w > 0.0).then_some((self.midtones, w))
        }
    }
}

fn clamp_offset(v: f32) -> f32 {
    if v.is_finite() {
        v.clamp(-100.0, 100.0)
    } else {
        0.0
    }
}

/// Shift pixels toward each zone's offset in place.
pub fn apply_color_balance(buffer: &mut PixelBuffer, balance: &ColorBalance) {
    if balance.is_identity() {
        return;
    }
    for px in buffer.pixels_mut() {
        let (r, g, b) = (px[0] as f32, px[1] as f32, px[2] as f32);
        let Some((offset, w)) = balance.offset_for(luma(r, g, b)) else {
            continue;
        };
        px[0] = to_channel(r + offset[0] * w);
        px[1] = to_channel(g + offset[1] * w);
        px[2] = to_channel(b + offset[2] * w);
    }
}
