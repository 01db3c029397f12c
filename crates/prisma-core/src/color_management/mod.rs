//! Color math: HSL conversions, hue arithmetic, and luminance weights.

pub mod color_space;

pub use color_space::{hsl_to_rgb, hue_distance, normalize_hue, rgb_to_hsl};

/// Rec. 601 luma weights used throughout the 8-bit pipeline.
pub const LUMA_REC601: [f32; 3] = [0.299, 0.587, 0.114];

/// Rec. 601 luma of an RGB triple, in the same units as the input.
#[inline]
pub fn luma(r: f32, g: f32, b: f32) -> f32 {
    r * LUMA_REC601[0] + g * LUMA_REC601[1] + b * LUMA_REC601[2]
}

/// 8-bit luma bucket: `round(0.299R + 0.587G + 0.114B)` clamped to 0–255.
#[inline]
pub fn luma_u8(r: u8, g: u8, b: u8) -> u8 {
    crate::image::to_channel(luma(r as f32, g as f32, b as f32))
}
