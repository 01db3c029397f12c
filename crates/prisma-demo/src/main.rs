//! Prisma demo: grade image files from the command line.
//!
//! Every input is sent through one worker thread as a batch; results are
//! written next to the input (or to `--output` / `--output-dir`).

mod cli;
mod image_loader;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Parser;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use prisma_core::{BlendMode, ChannelStats, Histogram, Layer, LayerStack, PixelBuffer};
use prisma_worker::{WorkerConfig, WorkerReply, WorkerRequest};

use cli::CliArgs;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = CliArgs::parse();
    if args.output.is_some() && args.input.len() > 1 {
        bail!("--output takes one input; use --output-dir for batches");
    }
    let params = args.params().context("invalid grading flags")?;

    let mut originals = Vec::with_capacity(args.input.len());
    for path in &args.input {
        let buffer = image_loader::load_image(path)
            .with_context(|| format!("failed to load {}", path.display()))?;
        originals.push(buffer);
    }

    let config = WorkerConfig::default();
    tracing::info!(worker = %config.name, images = originals.len(), "grading");
    let mut worker = prisma_worker::spawn(config)?;

    let requests = originals.iter().map(|buffer| {
        if args.stats_only {
            WorkerRequest::histogram(buffer)
        } else {
            WorkerRequest::process(buffer, params.clone())
        }
    });
    let results = worker.process_batch(requests);

    let total = results.len();
    let mut failures = 0usize;
    for ((path, original), result) in args.input.iter().zip(originals).zip(results) {
        let outcome = result
            .map_err(anyhow::Error::from)
            .and_then(|reply| finish(&args, path, original, reply));
        if let Err(e) = outcome {
            tracing::error!(path = %path.display(), "{e:#}");
            failures += 1;
        }
    }

    if failures > 0 {
        bail!("{failures} of {total} images failed");
    }
    Ok(())
}

/// Write (or just report) one worker reply.
fn finish(args: &CliArgs, input: &Path, original: PixelBuffer, reply: WorkerReply) -> Result<()> {
    match reply {
        WorkerReply::Processed { buffer, stats, .. } => {
            let graded = PixelBuffer::try_from(buffer)?;
            let (result, stats) = apply_mix(args, original, graded, stats)?;
            let target = output_path(args, input);
            image_loader::save_image(&target, &result)
                .with_context(|| format!("failed to write {}", target.display()))?;
            tracing::info!(
                input = %input.display(),
                output = %target.display(),
                "written"
            );
            if args.stats {
                print_report(input, &result, &stats)?;
            }
        }
        WorkerReply::Histogram { stats, .. } => print_report(input, &original, &stats)?,
        WorkerReply::Error { code, message } => bail!("{code:?}: {message}"),
    }
    Ok(())
}

/// Apply `--mix` when set. The returned stats always describe the returned
/// buffer, so a mixed result is measured again.
fn apply_mix(
    args: &CliArgs,
    original: PixelBuffer,
    graded: PixelBuffer,
    stats: ChannelStats,
) -> Result<(PixelBuffer, ChannelStats)> {
    match args.mix {
        Some(opacity) => {
            let mixed = mix(original, graded, opacity, args.blend)?;
            let stats = Histogram::compute(&mixed).summary();
            Ok((mixed, stats))
        }
        None => Ok((graded, stats)),
    }
}

/// Lay the graded image over the original.
fn mix(
    original: PixelBuffer,
    graded: PixelBuffer,
    opacity: f32,
    mode: BlendMode,
) -> Result<PixelBuffer> {
    let (width, height) = original.dimensions();
    let mut stack = LayerStack::new(width, height)?;
    stack.add_layer(Layer::new("original", original))?;
    let top = stack.add_layer(Layer::new("graded", graded).with_blend_mode(mode))?;
    stack.set_opacity(top, opacity)?;
    Ok(stack.composite()?)
}

fn output_path(args: &CliArgs, input: &Path) -> PathBuf {
    if let Some(output) = &args.output {
        return output.clone();
    }
    let stem = input.file_stem().and_then(|s| s.to_str()).unwrap_or("image");
    match &args.output_dir {
        Some(dir) => dir.join(format!("{stem}.png")),
        None => input.with_file_name(format!("{stem}_graded.png")),
    }
}

#[derive(Serialize)]
struct Report<'a> {
    file: String,
    width: u32,
    height: u32,
    stats: &'a ChannelStats,
}

fn print_report(input: &Path, buffer: &PixelBuffer, stats: &ChannelStats) -> Result<()> {
    let report = Report {
        file: input.display().to_string(),
        width: buffer.width(),
        height: buffer.height(),
        stats,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(extra: &[&str]) -> CliArgs {
        let mut argv = vec!["prisma", "-i", "in.png"];
        argv.extend_from_slice(extra);
        CliArgs::parse_from(argv)
    }

    fn solid(value: u8) -> PixelBuffer {
        PixelBuffer::filled(2, 2, [value, value, value, 255]).unwrap()
    }

    #[test]
    fn test_mix_reports_stats_of_mixed_buffer() {
        let graded_stats = Histogram::compute(&solid(255)).summary();
        let args = args(&["--mix", "0.5"]);
        let (result, stats) = apply_mix(&args, solid(0), solid(255), graded_stats).unwrap();
        let [r, _, _, _] = result.pixel(0, 0);
        assert!((127..=128).contains(&r), "{r}");
        assert_eq!(stats, Histogram::compute(&result).summary());
        assert!((stats.red.mean - r as f64).abs() < 1e-9);
    }

    #[test]
    fn test_no_mix_keeps_worker_stats() {
        let graded_stats = Histogram::compute(&solid(200)).summary();
        let expected = graded_stats;
        let (result, stats) = apply_mix(&args(&[]), solid(0), solid(200), graded_stats).unwrap();
        assert_eq!(result, solid(200));
        assert_eq!(stats, expected);
    }
}
