//! Request parameters and the stage pipeline that applies them.

pub mod params;
pub mod pipeline;

pub use params::{Adjustments, PipelineConfig, ProcessParams, SharpenParams};
pub use pipeline::{Pipeline, ProcessOutput, Stage};
