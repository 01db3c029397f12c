//! RGB + luminance histogram computation and summary statistics.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::color_management::luma_u8;
use crate::image::PixelBuffer;

/// Number of bins per channel.
pub const BINS: usize = 256;

/// Channel selector for statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Luminance,
    Red,
    Green,
    Blue,
}

impl Channel {
    pub const ALL: [Channel; 4] = [
        Channel::Luminance,
        Channel::Red,
        Channel::Green,
        Channel::Blue,
    ];
}

/// Histogram data for luminance, R, G, and B (256 bins each).
///
/// Every channel's counts sum to the pixel count of the source buffer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Histogram {
    pub luminance: Vec<u32>,
    pub red: Vec<u32>,
    pub green: Vec<u32>,
    pub blue: Vec<u32>,
}

impl Default for Histogram {
    fn default() -> Self {
        Self {
            luminance: vec![0; BINS],
            red: vec![0; BINS],
            green: vec![0; BINS],
            blue: vec![0; BINS],
        }
    }
}

impl Histogram {
    /// Bucket every pixel of `buffer`. Alpha is ignored.
    ///
    /// Luminance uses `round(0.299R + 0.587G + 0.114B)`.
    pub fn compute(buffer: &PixelBuffer) -> Self {
        let mut hist = Self::default();
        for px in buffer.pixels() {
            let (r, g, b) = (px[0], px[1], px[2]);
            hist.red[r as usize] += 1;
            hist.green[g as usize] += 1;
            hist.blue[b as usize] += 1;
            hist.luminance[luma_u8(r, g, b) as usize] += 1;
        }
        trace!(pixels = buffer.pixel_count(), "histogram computed");
        hist
    }

    /// Bins for one channel.
    pub fn channel(&self, channel: Channel) -> &[u32] {
        match channel {
            Channel::Luminance => &self.luminance,
            Channel::Red => &self.red,
            Channel::Green => &self.green,
            Channel::Blue => &self.blue,
        }
    }

    /// Sample count (the same for every channel).
    pub fn total(&self) -> u64 {
        self.luminance.iter().map(|&c| c as u64).sum()
    }

    /// Largest bin across all channels, for display normalization.
    pub fn peak(&self) -> u32 {
        Channel::ALL
            .iter()
            .flat_map(|&c| self.channel(c).iter().copied())
            .max()
            .unwrap_or(0)
    }

    /// Statistics for one channel.
    pub fn stats(&self, channel: Channel) -> HistogramStats {
        HistogramStats::from_bins(self.channel(channel))
    }

    /// Statistics for all four channels.
    pub fn summary(&self) -> ChannelStats {
        ChannelStats {
            luminance: self.stats(Channel::Luminance),
            red: self.stats(Channel::Red),
            green: self.stats(Channel::Green),
            blue: self.stats(Channel::Blue),
        }
    }
}

/// Summary statistics of one 256-bin channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HistogramStats {
    pub count: u64,
    pub mean: f64,
    pub median: u8,
    pub std_dev: f64,
}

impl HistogramStats {
    /// Compute stats from bin counts.
    ///
    /// ```text
    /// mean    = Σ i·f(i) / Σ f(i)
    /// median  = element at index ⌊n/2⌋ of the expanded sorted values
    /// std_dev = sqrt(Σ f(i)·(i − mean)² / Σ f(i))
    /// ```
    ///
    /// Mean and standard deviation keep full `f64` precision, and the
    /// variance is taken around the unrounded mean. Callers that show
    /// integer statistics round at display time.
    ///
    /// An empty histogram yields all zeros.
    pub fn from_bins(bins: &[u32]) -> Self {
        let count: u64 = bins.iter().map(|&f| f as u64).sum();
        if count == 0 {
            return Self::default();
        }
        let n = count as f64;

        let weighted: f64 = bins
            .iter()
            .enumerate()
            .map(|(i, &f)| i as f64 * f as f64)
            .sum();
        let mean = weighted / n;

        let squared: f64 = bins
            .iter()
            .enumerate()
            .map(|(i, &f)| f as f64 * (i as f64 - mean).powi(2))
            .sum();
        let variance = squared / n;

        let target = count / 2;
        let mut seen = 0u64;
        let mut median = 0u8;
        for (i, &f) in bins.iter().enumerate() {
            seen += f as u64;
            if seen > target {
                median = i.min(u8::MAX as usize) as u8;
                break;
            }
        }

        Self {
            count,
            mean,
            median,
            std_dev: variance.sqrt(),
        }
    }
}

/// Per-channel statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelStats {
    pub luminance: HistogramStats,
    pub red: HistogramStats,
    pub green: HistogramStats,
    pub blue: HistogramStats,
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    fn scenario() -> PixelBuffer {
        PixelBuffer::from_pixels(
            2,
            2,
            &[
                [0, 0, 0, 255],
                [255, 255, 255, 255],
                [128, 128, 128, 255],
                [200, 50, 50, 255],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_two_by_two_luminance_bins() {
        let hist = Histogram::compute(&scenario());
        // 0.299·200 + 0.587·50 + 0.114·50 = 94.85
        for bin in [0, 95, 128, 255] {
            assert_eq!(hist.luminance[bin], 1, "bin {bin}");
        }
        assert_eq!(hist.total(), 4);
        assert_eq!(hist.red[200], 1);
        assert_eq!(hist.green[50], 1);
    }

    #[test]
    fn test_two_by_two_stats() {
        let stats = Histogram::compute(&scenario()).stats(Channel::Luminance);
        assert_eq!(stats.count, 4);
        assert!((stats.mean - 119.5).abs() < EPSILON, "{}", stats.mean);
        // Sorted [0, 95, 128, 255], index 2.
        assert_eq!(stats.median, 128);
        let deviations = [119.5f64, 24.5, 8.5, 135.5];
        let expected = (deviations.iter().map(|d| d * d).sum::<f64>() / 4.0).sqrt();
        assert!((stats.std_dev - expected).abs() < 1e-6);
    }

    #[test]
    fn test_every_channel_sums_to_pixel_count() {
        let mut pixels = Vec::new();
        for i in 0..=255u8 {
            pixels.push([i, i.wrapping_mul(7), 255 - i, i / 3]);
        }
        let buf = PixelBuffer::from_pixels(16, 16, &pixels).unwrap();
        let hist = Histogram::compute(&buf);
        for channel in Channel::ALL {
            let sum: u64 = hist.channel(channel).iter().map(|&c| c as u64).sum();
            assert_eq!(sum, 256, "{channel:?}");
        }
    }

    #[test]
    fn test_empty_bins_give_zero_stats() {
        let empty = HistogramStats::from_bins(&[0; BINS]);
        assert_eq!(empty, HistogramStats::default());
        assert_eq!(Histogram::default().peak(), 0);
    }

    #[test]
    fn test_peak_and_summary() {
        let buf = PixelBuffer::filled(3, 1, [10, 10, 10, 255]).unwrap();
        let hist = Histogram::compute(&buf);
        assert_eq!(hist.peak(), 3);
        let summary = hist.summary();
        assert_eq!(summary.red.median, 10);
        assert_eq!(summary.blue.std_dev, 0.0);
    }
}
