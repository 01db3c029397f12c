//! Separable Gaussian blur and unsharp mask.
//!
//! Edges clamp: samples past the border reuse the nearest edge pixel.
//! The horizontal pass writes `f32` intermediates so only the final
//! vertical pass rounds. Alpha is copied from the input.

use tracing::trace;

use crate::filters::kernel::{GaussianKernel, shared_cache};
use crate::image::{CHANNELS, PixelBuffer, to_channel};

/// Blur with the cached kernel for `radius`.
pub fn gaussian_blur(input: &PixelBuffer, radius: u32) -> PixelBuffer {
    let kernel = shared_cache().get(radius);
    blur_with_kernel(input, &kernel)
}

/// Blur with an explicit kernel.
pub fn blur_with_kernel(input: &PixelBuffer, kernel: &GaussianKernel) -> PixelBuffer {
    if kernel.is_identity() {
        return input.clone();
    }
    let (width, height) = (input.width() as usize, input.height() as usize);
    let src = input.as_bytes();
    let weights = kernel.weights();
    let half = kernel.half_len() as isize;

    trace!(width, height, taps = weights.len(), "gaussian blur");

    // Horizontal: u8 → f32 RGB.
    let mut temp = vec![0.0f32; width * height * 3];
    for y in 0..height {
        let row = y * width;
        for x in 0..width {
            let mut acc = [0.0f32; 3];
            let mut total = 0.0f32;
            for (k, &w) in weights.iter().enumerate() {
                let sx = clamp_index(x as isize + k as isize - half, width);
                let i = (row + sx) * CHANNELS;
                acc[0] += src[i] as f32 * w;
                acc[1] += src[i + 1] as f32 * w;
                acc[2] += src[i + 2] as f32 * w;
                total += w;
            }
            let o = (row + x) * 3;
            temp[o] = acc[0] / total;
            temp[o + 1] = acc[1] / total;
            temp[o + 2] = acc[2] / total;
        }
    }

    // Vertical: f32 → u8 RGBA.
    let mut out = input.clone();
    let dst = out.as_bytes_mut();
    for y in 0..height {
        for x in 0..width {
            let mut acc = [0.0f32; 3];
            let mut total = 0.0f32;
            for (k, &w) in weights.iter().enumerate() {
                let sy = clamp_index(y as isize + k as isize - half, height);
                let i = (sy * width + x) * 3;
                acc[0] += temp[i] * w;
                acc[1] += temp[i + 1] * w;
                acc[2] += temp[i + 2] * w;
                total += w;
            }
            let o = (y * width + x) * CHANNELS;
            dst[o] = to_channel(acc[0] / total);
            dst[o + 1] = to_channel(acc[1] / total);
            dst[o + 2] = to_channel(acc[2] / total);
        }
    }
    out
}

/// Sharpen `buffer` in place by amplifying its difference from a blurred copy.
///
/// A pixel is sharpened only when its largest RGB difference from the blur
/// reaches `threshold`; then every channel becomes
/// `orig + amount × (orig − blur)`, clamped. Alpha is untouched.
pub fn unsharp_mask(buffer: &mut PixelBuffer, amount: f32, radius: u32, threshold: u8) {
    if amount == 0.0 || radius == 0 {
        return;
    }
    let blurred = gaussian_blur(buffer, radius);
    let threshold = threshold as i16;
    let mut changed = 0usize;

    for (px, blur) in buffer.pixels_mut().zip(blurred.pixels()) {
        let diff = [
            px[0] as i16 - blur[0] as i16,
            px[1] as i16 - blur[1] as i16,
            px[2] as i16 - blur[2] as i16,
        ];
        let largest = diff.iter().map(|d| d.abs()).max().unwrap_or(0);
        if largest < threshold {
            continue;
        }
        for c in 0..3 {
            px[c] = to_channel(px[c] as f32 + amount * diff[c] as f32);
        }
        changed += 1;
    }
    trace!(amount, radius, threshold, changed, "unsharp mask");
}

#[inline]
fn clamp_index(i: isize, len: usize) -> usize {
    i.clamp(0, len as isize - 1) as usize
}
