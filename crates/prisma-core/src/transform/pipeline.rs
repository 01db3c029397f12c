//! Processing pipeline that chains grading stages together.
//!
//! ```text
//! buffer -> Exposure -> Contrast -> Saturation -> Selective -> Balance -> Sharpen -> Histogram
//! ```
//!
//! Each stage takes the buffer by value and hands it to the next one. A
//! stage error abandons the whole run; nothing partial is returned.

use tracing::debug;

use crate::error::EngineError;
use crate::filters::convolution::unsharp_mask;
use crate::grading::balance::apply_color_balance;
use crate::grading::selective::apply_selective;
use crate::grading::tone::{apply_contrast, apply_exposure, apply_saturation};
use crate::image::PixelBuffer;
use crate::scopes::histogram::{ChannelStats, Histogram};
use crate::transform::params::{PipelineConfig, ProcessParams};

/// One step of the pipeline.
pub trait Stage: Send + Sync {
    fn name(&self) -> &str;
    fn apply(
        &self,
        input: PixelBuffer,
        params: &ProcessParams,
        config: &PipelineConfig,
    ) -> Result<PixelBuffer, EngineError>;
}

struct Exposure;
struct Contrast;
struct Saturation;
struct Selective;
struct Balance;
struct Sharpen;

impl Stage for Exposure {
    fn name(&self) -> &str {
        "exposure"
    }

    fn apply(
        &self,
        mut input: PixelBuffer,
        params: &ProcessParams,
        _: &PipelineConfig,
    ) -> Result<PixelBuffer, EngineError> {
        apply_exposure(&mut input, params.adjustments.exposure);
        Ok(input)
    }
}

impl Stage for Contrast {
    fn name(&self) -> &str {
        "contrast"
    }

    fn apply(
        &self,
        mut input: PixelBuffer,
        params: &ProcessParams,
        _: &PipelineConfig,
    ) -> Result<PixelBuffer, EngineError> {
        apply_contrast(&mut input, params.adjustments.contrast);
        Ok(input)
    }
}

impl Stage for Saturation {
    fn name(&self) -> &str {
        "saturation"
    }

    fn apply(
        &self,
        mut input: PixelBuffer,
        params: &ProcessParams,
        _: &PipelineConfig,
    ) -> Result<PixelBuffer, EngineError> {
        apply_saturation(&mut input, params.adjustments.saturation);
        Ok(input)
    }
}

impl Stage for Selective {
    fn name(&self) -> &str {
        "selective"
    }

    fn apply(
        &self,
        mut input: PixelBuffer,
        params: &ProcessParams,
        _: &PipelineConfig,
    ) -> Result<PixelBuffer, EngineError> {
        apply_selective(&mut input, &params.selective);
        Ok(input)
    }
}

impl Stage for Balance {
    fn name(&self) -> &str {
        "balance"
    }

    fn apply(
        &self,
        mut input: PixelBuffer,
        params: &ProcessParams,
        _: &PipelineConfig,
    ) -> Result<PixelBuffer, EngineError> {
        apply_color_balance(&mut input, &params.balance.clamped());
        Ok(input)
    }
}

impl Stage for Sharpen {
    fn name(&self) -> &str {
        "sharpen"
    }

    fn apply(
        &self,
        mut input: PixelBuffer,
        params: &ProcessParams,
        config: &PipelineConfig,
    ) -> Result<PixelBuffer, EngineError> {
        if let Some(s) = params.adjustments.sharpen(config) {
            unsharp_mask(&mut input, s.amount, s.radius, s.threshold);
        }
        Ok(input)
    }
}

/// Result of one processing run.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessOutput {
    pub buffer: PixelBuffer,
    pub histogram: Histogram,
    pub stats: ChannelStats,
}

/// Ordered stage list plus the defaults it runs with.
pub struct Pipeline {
    stages: Vec<Box<dyn Stage>>,
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            stages: vec![
                Box::new(Exposure),
                Box::new(Contrast),
                Box::new(Saturation),
                Box::new(Selective),
                Box::new(Balance),
                Box::new(Sharpen),
            ],
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Stage names in execution order.
    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Run every stage, then measure the result.
    pub fn process(
        &self,
        input: PixelBuffer,
        params: &ProcessParams,
    ) -> Result<ProcessOutput, EngineError> {
        let buffer = self.grade(input, params)?;
        let histogram = Histogram::compute(&buffer);
        let stats = histogram.summary();
        Ok(ProcessOutput {
            buffer,
            histogram,
            stats,
        })
    }

    /// Run every stage without computing statistics.
    pub fn grade(
        &self,
        input: PixelBuffer,
        params: &ProcessParams,
    ) -> Result<PixelBuffer, EngineError> {
        let mut current = input;
        for stage in &self.stages {
            debug!(stage = stage.name(), "processing");
            current = stage.apply(current, params, &self.config)?;
        }
        Ok(current)
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(PipelineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grading::bands::{Band, BandProperty};
    use crate::grading::selective::SelectiveColorState;
    use crate::scopes::histogram::Channel;
    use crate::transform::params::Adjustments;

    fn gradient() -> PixelBuffer {
        let mut pixels = Vec::new();
        for y in 0..8u8 {
            for x in 0..8u8 {
                pixels.push([x * 30, y * 30, 255 - x * 20, 200 + y]);
            }
        }
        PixelBuffer::from_pixels(8, 8, &pixels).unwrap()
    }

    #[test]
    fn test_stage_order() {
        let pipeline = Pipeline::default();
        let expected = [
            "exposure",
            "contrast",
            "saturation",
            "selective",
            "balance",
            "sharpen",
        ];
        assert_eq!(pipeline.stage_names(), expected);
    }

    #[test]
    fn test_default_params_are_identity() {
        let pipeline = Pipeline::default();
        let output = pipeline.process(gradient(), &ProcessParams::default()).unwrap();
        assert_eq!(output.buffer, gradient());
        assert_eq!(output.histogram.total(), 64);
        let luminance = output.histogram.stats(Channel::Luminance);
        assert_eq!(output.stats.luminance, luminance);
    }

    #[test]
    fn test_exposure_doubles_then_clamps() {
        let input = PixelBuffer::from_pixels(1, 1, &[[60, 130, 250, 255]]).unwrap();
        let adjustments = Adjustments::from_map([("exposure", 100.0)]).unwrap();
        let params = ProcessParams::new(adjustments);
        let pipeline = Pipeline::default();
        let out = pipeline.process(input, &params).unwrap();
        assert_eq!(out.buffer.pixel(0, 0), [120, 255, 255, 255]);
        assert_eq!(out.histogram.red[120], 1);
    }

    #[test]
    fn test_tone_runs_before_selective() {
        // Desaturating first leaves nothing for the red band to find.
        let input = PixelBuffer::from_pixels(1, 1, &[[220, 40, 40, 255]]).unwrap();
        let mut selective = SelectiveColorState::new();
        selective
            .set_band_value(Band::Red, BandProperty::Luminance, 100.0)
            .unwrap();
        let adjustments = Adjustments::from_map([("saturation", -100.0)]).unwrap();
        let params = ProcessParams::new(adjustments).with_selective(selective);
        let pipeline = Pipeline::default();
        let out = pipeline.process(input, &params).unwrap();
        let [r, g, b, _] = out.buffer.pixel(0, 0);
        assert_eq!((r, g), (g, b));
    }

    #[test]
    fn test_sharpness_changes_edges_only() {
        let mut input = PixelBuffer::filled(6, 1, [50, 50, 50, 255]).unwrap();
        for x in 3..6 {
            input.set_pixel(x, 0, [200, 200, 200, 255]);
        }
        let controls = [("sharpness", 100.0), ("sharpen_radius", 2.0)];
        let params = ProcessParams::new(Adjustments::from_map(controls).unwrap());
        let pipeline = Pipeline::default();
        let out = pipeline.process(input.clone(), &params).unwrap();
        assert_eq!(out.buffer.pixel(0, 0), input.pixel(0, 0));
        assert!(out.buffer.pixel(2, 0)[0] < 50);
        assert!(out.buffer.pixel(3, 0)[0] > 200);
    }
}
