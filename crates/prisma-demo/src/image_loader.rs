//! Image file I/O for the demo binary.

use std::path::Path;

use prisma_core::{EngineError, PixelBuffer};

/// Load an image from disk as 8-bit RGBA.
///
/// Supports common formats via the `image` crate (PNG, JPEG, TIFF, WEBP, …).
/// Higher bit depths are quantized to 8 bits.
pub fn load_image(path: &Path) -> Result<PixelBuffer, ImageLoadError> {
    let img = image::open(path).map_err(ImageLoadError::Decode)?;
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    tracing::debug!(path = %path.display(), width, height, "image loaded");
    Ok(PixelBuffer::new(width, height, rgba.into_raw())?)
}

/// Write a buffer to disk; the format follows the file extension.
pub fn save_image(path: &Path, buffer: &PixelBuffer) -> Result<(), ImageLoadError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    image::save_buffer(
        path,
        buffer.as_bytes(),
        buffer.width(),
        buffer.height(),
        image::ColorType::Rgba8,
    )
    .map_err(ImageLoadError::Encode)
}

/// Errors that can occur during image loading and saving.
#[derive(Debug, thiserror::Error)]
pub enum ImageLoadError {
    #[error("failed to decode image: {0}")]
    Decode(image::ImageError),
    #[error("failed to encode image: {0}")]
    Encode(image::ImageError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Buffer(#[from] EngineError),
}
