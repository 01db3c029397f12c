//! Global tone adjustments (exposure, contrast, saturation) in 8-bit RGB.
//!
//! Each operator runs as one in-place pass over the buffer and is skipped
//! entirely when its value is zero. Alpha is never touched.
//!
//! ```text
//! exposure:   out = in × 2^(v / 100)
//! contrast:   out = f × (in − 128) + 128,   f = 259(v + 255) / (255(259 − v))
//! saturation: out = gray + (in − gray) × (1 + v / 100),   gray = Rec.601 luma
//! ```
//!
//! Order matters and is fixed by the pipeline: exposure, then contrast,
//! then saturation.

use tracing::trace;

use crate::color_management::luma;
use crate::image::{PixelBuffer, to_channel};

/// Multiplier for an exposure value (`+100` doubles, `−100` halves).
pub fn exposure_factor(value: f32) -> f32 {
    (value / 100.0).exp2()
}

/// Contrast slope around the 128 midpoint. `value = 0` gives exactly `1.0`.
pub fn contrast_factor(value: f32) -> f32 {
    (259.0 * (value + 255.0)) / (255.0 * (259.0 - value))
}

/// Saturation multiplier applied to the distance from gray.
pub fn saturation_factor(value: f32) -> f32 {
    1.0 + value / 100.0
}

/// Scale R, G, B by `2^(value/100)` and clamp.
pub fn apply_exposure(buffer: &mut PixelBuffer, value: f32) {
    if value == 0.0 {
        return;
    }
    let factor = exposure_factor(value);
    trace!(value, factor, "exposure pass");
    map_rgb(buffer, |c| c * factor);
}

/// Stretch or compress channel distances from the 128 midpoint.
pub fn apply_contrast(buffer: &mut PixelBuffer, value: f32) {
    if value == 0.0 {
        return;
    }
    let factor = contrast_factor(value);
    trace!(value, factor, "contrast pass");
    map_rgb(buffer, |c| factor * (c - 128.0) + 128.0);
}

/// Push channels toward or away from their Rec. 601 luma.
///
/// `−100` produces grayscale.
pub fn apply_saturation(buffer: &mut PixelBuffer, value: f32) {
    if value == 0.0 {
        return;
    }
    let factor = saturation_factor(value);
    trace!(value, factor, "saturation pass");
    for px in buffer.pixels_mut() {
        let (r, g, b) = (px[0] as f32, px[1] as f32, px[2] as f32);
        let gray = luma(r, g, b);
        px[0] = to_channel(gray + (r - gray) * factor);
        px[1] = to_channel(gray + (g - gray) * factor);
        px[2] = to_channel(gray + (b - gray) * factor);
    }
}

fn map_rgb(buffer: &mut PixelBuffer, f: impl Fn(f32) -> f32) {
    for px in buffer.pixels_mut() {
        for c in &mut px[..3] {
            *c = to_channel(f(*c as f32));
        }
    }
}
