//! Command-line arguments for the headless grader.

use std::path::PathBuf;

use clap::Parser;
use prisma_core::grading::ColorBalance;
use prisma_core::{Adjustments, BlendMode, EngineError, ProcessParams, SelectiveColorState};

#[derive(Parser, Debug)]
#[command(
    name = "prisma",
    about = "Headless color grader: applies tone, selective color and sharpening to images",
    long_about = "Grade image files through the Prisma worker and write the results.\n\n\
                  Example:\n  \
                  prisma -i photo.jpg -o graded.png --exposure 20 --band red.saturation=-40\n  \
                  prisma -i shots/a.png shots/b.png --output-dir out/ --sharpness 60 --stats"
)]
pub struct CliArgs {
    /// Input image file(s).
    #[arg(short, long, required = true, num_args = 1..)]
    pub input: Vec<PathBuf>,

    /// Output file. Only valid with a single input.
    #[arg(short, long, value_name = "FILE", conflicts_with = "output_dir")]
    pub output: Option<PathBuf>,

    /// Output directory; files keep their stem and are written as PNG.
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Exposure, −100 halves and +100 doubles.
    #[arg(long, allow_hyphen_values = true)]
    pub exposure: Option<f32>,

    /// Contrast around mid-gray.
    #[arg(long, allow_hyphen_values = true)]
    pub contrast: Option<f32>,

    /// Global saturation, −100 is grayscale.
    #[arg(long, allow_hyphen_values = true)]
    pub saturation: Option<f32>,

    /// Unsharp-mask strength, 0–100.
    #[arg(long)]
    pub sharpness: Option<f32>,

    /// Extra control as `name=value`, e.g. `sharpen_radius=2`.
    #[arg(long = "adjust", value_name = "NAME=VALUE")]
    pub adjust: Vec<String>,

    /// Selective color offset as `band.property=value`, e.g. `aqua.hue=-15`.
    #[arg(long = "band", value_name = "BAND.PROPERTY=VALUE", allow_hyphen_values = true)]
    pub band: Vec<String>,

    /// Shadow RGB offset as `r,g,b`.
    #[arg(long, value_name = "R,G,B", allow_hyphen_values = true)]
    pub shadows: Option<String>,

    /// Midtone RGB offset as `r,g,b`.
    #[arg(long, value_name = "R,G,B", allow_hyphen_values = true)]
    pub midtones: Option<String>,

    /// Highlight RGB offset as `r,g,b`.
    #[arg(long, value_name = "R,G,B", allow_hyphen_values = true)]
    pub highlights: Option<String>,

    /// Composite the graded image over the original at this opacity (0–1).
    #[arg(long, value_name = "OPACITY")]
    pub mix: Option<f32>,

    /// Blend mode used with `--mix`.
    #[arg(long, default_value = "normal", value_parser = parse_blend_mode)]
    pub blend: BlendMode,

    /// Only measure the inputs; do not grade or write anything.
    #[arg(long)]
    pub stats_only: bool,

    /// Print per-channel statistics as JSON.
    #[arg(long)]
    pub stats: bool,
}

impl CliArgs {
    /// Collect every grading flag into request parameters.
    pub fn params(&self) -> Result<ProcessParams, EngineError> {
        let mut adjustments = Adjustments::new();
        for (key, value) in [
            ("exposure", self.exposure),
            ("contrast", self.contrast),
            ("saturation", self.saturation),
            ("sharpness", self.sharpness),
        ] {
            if let Some(value) = value {
                adjustments.set(key, value)?;
            }
        }
        for raw in &self.adjust {
            let (key, value) = split_assignment(raw)?;
            adjustments.set(key, value)?;
        }

        let mut selective = SelectiveColorState::new();
        for raw in &self.band {
            let (target, value) = split_assignment(raw)?;
            let (band, property) = target.split_once('.').ok_or_else(|| {
                EngineError::invalid(format!("expected `band.property=value`, got `{raw}`"))
            })?;
            selective.set_band_value_by_name(band, property, value)?;
        }

        let balance = ColorBalance {
            shadows: parse_rgb(self.shadows.as_deref())?,
            midtones: parse_rgb(self.midtones.as_deref())?,
            highlights: parse_rgb(self.highlights.as_deref())?,
        };

        Ok(ProcessParams::new(adjustments)
            .with_selective(selective)
            .with_balance(balance))
    }
}

fn parse_blend_mode(s: &str) -> Result<BlendMode, String> {
    s.parse().map_err(|e: EngineError| e.to_string())
}

fn split_assignment(raw: &str) -> Result<(&str, f32), EngineError> {
    let Some((key, value)) = raw.split_once('=') else {
        return Err(EngineError::invalid(format!(
            "expected `name=value`, got `{raw}`"
        )));
    };
    let Ok(number) = value.trim().parse() else {
        return Err(EngineError::invalid(format!(
            "`{value}` is not a number in `{raw}`"
        )));
    };
    Ok((key.trim(), number))
}

fn parse_rgb(raw: Option<&str>) -> Result<[f32; 3], EngineError> {
    let Some(raw) = raw else {
        return Ok([0.0; 3]);
    };
    let malformed = || EngineError::invalid(format!("expected `r,g,b`, got `{raw}`"));
    let parts: Vec<f32> = raw
        .split(',')
        .map(|p| p.trim().parse::<f32>())
        .collect::<Result<_, _>>()
        .map_err(|_| malformed())?;
    <[f32; 3]>::try_from(parts).map_err(|_| malformed())
}
