//! Prisma Core: pixel-processing and color-grading engine.
//!
//! This crate contains all color math, tone and selective grading,
//! convolution filters, histogram statistics, and layer compositing.
//! No threads, no I/O, no framework dependencies.

pub mod color_management;
pub mod error;
pub mod filters;
pub mod grading;
pub mod image;
pub mod layers;
pub mod scopes;
pub mod transform;

// Re-exports for convenience.
pub use error::{EngineError, ErrorCode};
pub use grading::balance::ColorBalance;
pub use grading::bands::{Band, BandProperty};
pub use grading::selective::{BandAdjustment, SelectiveColorState};
pub use image::PixelBuffer;
pub use layers::{BlendMode, Layer, LayerId, LayerStack, Mask, composite};
pub use scopes::histogram::{Channel, ChannelStats, Histogram, HistogramStats};
pub use transform::params::{Adjustments, PipelineConfig, ProcessParams};
pub use transform::pipeline::{Pipeline, ProcessOutput};
