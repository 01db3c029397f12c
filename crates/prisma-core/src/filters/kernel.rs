//! 1D Gaussian kernels and the process-wide kernel cache.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use parking_lot::Mutex;
use tracing::trace;

/// Longest kernel ever built. Larger radii keep `sigma = radius / 3` but
/// truncate the support to 7 taps either side.
pub const MAX_KERNEL_LEN: usize = 15;

/// Normalized, odd-length, symmetric 1D Gaussian weights.
#[derive(Debug, Clone, PartialEq)]
pub struct GaussianKernel {
    radius: u32,
    weights: Vec<f32>,
}

impl GaussianKernel {
    /// Build the kernel for `radius`.
    ///
    /// ```text
    /// sigma = radius / 3
    /// len   = min(2·radius + 1, 15)
    /// w[i]  = exp(−x² / 2σ²) / Σ,   x = i − len/2
    /// ```
    ///
    /// Radius 0 yields the single-tap identity kernel `[1.0]`.
    pub fn new(radius: u32) -> Self {
        if radius == 0 {
            return Self {
                radius,
                weights: vec![1.0],
            };
        }
        let len = (2 * radius as usize + 1).min(MAX_KERNEL_LEN);
        let half = (len / 2) as i32;
        let sigma = radius as f32 / 3.0;
        let denom = 2.0 * sigma * sigma;

        let mut weights: Vec<f32> = (-half..=half)
            .map(|i| {
                let x = i as f32;
                (-x * x / denom).exp()
            })
            .collect();
        let sum: f32 = weights.iter().sum();
        for w in &mut weights {
            *w /= sum;
        }
        Self { radius, weights }
    }

    pub fn radius(&self) -> u32 {
        self.radius
    }

    /// Taps either side of the center.
    pub fn half_len(&self) -> usize {
        self.weights.len() / 2
    }

    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    /// Whether this is the identity kernel.
    pub fn is_identity(&self) -> bool {
        self.weights.len() == 1
    }
}

/// Radius-keyed cache of built kernels.
///
/// Building is idempotent, so two threads racing on the same radius both
/// end up with equal kernels; the lock only guards the map itself.
#[derive(Debug, Default)]
pub struct KernelCache {
    kernels: Mutex<HashMap<u32, Arc<GaussianKernel>>>,
}

impl KernelCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch or build the kernel for `radius`.
    pub fn get(&self, radius: u32) -> Arc<GaussianKernel> {
        let mut kernels = self.kernels.lock();
        kernels
            .entry(radius)
            .or_insert_with(|| {
                trace!(radius, "building gaussian kernel");
                Arc::new(GaussianKernel::new(radius))
            })
            .clone()
    }

    /// Number of cached radii.
    pub fn len(&self) -> usize {
        self.kernels.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

static SHARED: LazyLock<KernelCache> = LazyLock::new(KernelCache::new);

/// The cache shared by every pipeline in the process.
pub fn shared_cache() -> &'static KernelCache {
    &SHARED
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-5;

    #[test]
    fn test_radius_zero_is_identity() {
        let k = GaussianKernel::new(0);
        assert!(k.is_identity());
        assert_eq!(k.weights(), &[1.0]);
    }

    #[test]
    fn test_kernel_is_normalized_and_symmetric() {
        for radius in [1, 2, 3, 5, 12] {
            let k = GaussianKernel::new(radius);
            let w = k.weights();
            assert_eq!(w.len() % 2, 1);
            let sum: f32 = w.iter().sum();
            assert!((sum - 1.0).abs() < EPSILON, "radius {radius}: sum {sum}");
            for i in 0..w.len() / 2 {
                assert!((w[i] - w[w.len() - 1 - i]).abs() < EPSILON);
            }
            assert!(w[k.half_len()] >= w[0]);
        }
    }

    #[test]
    fn test_kernel_length_is_capped() {
        assert_eq!(GaussianKernel::new(1).weights().len(), 3);
        assert_eq!(GaussianKernel::new(7).weights().len(), 15);
        assert_eq!(GaussianKernel::new(40).weights().len(), MAX_KERNEL_LEN);
    }

    #[test]
    fn test_cache_reuses_kernels() {
        let cache = KernelCache::new();
        assert!(cache.is_empty());
        let a = cache.get(3);
        let b = cache.get(3);
        assert!(Arc::ptr_eq(&a, &b));
        cache.get(4);
        assert_eq!(cache.len(), 2);
    }
}
