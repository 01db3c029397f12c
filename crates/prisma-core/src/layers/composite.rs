//! Bottom-to-top layer compositing.
//!
//! The accumulator starts fully transparent. For each visible layer and
//! pixel:
//!
//! ```text
//! α       = layer_alpha/255 × opacity × mask
//! blended = mode(acc_rgb, layer_rgb)
//! mixed   = layer_rgb·(1 − acc_α) + blended·acc_α
//! out_α   = α + acc_α·(1 − α)
//! out_rgb = (mixed·α + acc_rgb·acc_α·(1 − α)) / out_α
//! ```
//!
//! Over an opaque accumulator this reduces to `acc·(1 − α) + blended·α`.
//! Over transparency a layer shows its own color whatever its mode.

use tracing::debug;

use crate::error::EngineError;
use crate::image::{CHANNELS, PixelBuffer, to_channel};
use crate::layers::stack::Layer;

/// Composite `layers` (bottom first) onto a `width × height` canvas.
///
/// Every layer buffer and mask must match the canvas size; the first
/// mismatch fails the whole call with [`EngineError::DimensionMismatch`].
pub fn composite<'a, I>(width: u32, height: u32, layers: I) -> Result<PixelBuffer, EngineError>
where
    I: IntoIterator<Item = &'a Layer>,
{
    let mut out = PixelBuffer::transparent(width, height)?;
    let canvas = out.dimensions();
    let mut acc = vec![[0.0f32; 4]; out.pixel_count()];
    let mut drawn = 0usize;

    for layer in layers {
        if layer.buffer().dimensions() != canvas {
            return Err(EngineError::dimensions(canvas, layer.buffer().dimensions()));
        }
        if let Some(mask) = layer.mask()
            && mask.dimensions() != canvas
        {
            return Err(EngineError::dimensions(canvas, mask.dimensions()));
        }
        if !layer.is_visible() || layer.opacity() <= 0.0 {
            continue;
        }
        blend_layer(&mut acc, layer);
        drawn += 1;
    }

    for (dst, src) in out.as_bytes_mut().chunks_exact_mut(CHANNELS).zip(&acc) {
        for (d, s) in dst.iter_mut().zip(src) {
            *d = to_channel(s * 255.0);
        }
    }
    debug!(width, height, drawn, "layers composited");
    Ok(out)
}

fn blend_layer(acc: &mut [[f32; 4]], layer: &Layer) {
    let mode = layer.blend_mode();
    let opacity = layer.opacity();
    let mask = layer.mask();

    for (i, (base, px)) in acc.iter_mut().zip(layer.buffer().pixels()).enumerate() {
        let mut alpha = px[3] as f32 / 255.0 * opacity;
        if let Some(mask) = mask {
            alpha *= mask.factor(i);
        }
        if alpha <= 0.0 {
            continue;
        }

        let top = [px[0], px[1], px[2]].map(|c| c as f32 / 255.0);
        let below = [base[0], base[1], base[2]];
        let below_alpha = base[3];
        let blended = mode.blend_rgb(below, top);

        let out_alpha = alpha + below_alpha * (1.0 - alpha);
        for c in 0..3 {
            let mixed = top[c] * (1.0 - below_alpha) + blended[c] * below_alpha;
            base[c] = (mixed * alpha + below[c] * below_alpha * (1.0 - alpha)) / out_alpha;
        }
        base[3] = out_alpha;
    }
}
