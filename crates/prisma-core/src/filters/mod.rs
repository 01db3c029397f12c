//! Convolution filters.

pub mod convolution;
pub mod kernel;

pub use convolution::{gaussian_blur, unsharp_mask};
pub use kernel::{GaussianKernel, KernelCache};
