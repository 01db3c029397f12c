//! Per-pixel grading operators: tone, selective color, and color balance.

pub mod balance;
pub mod bands;
pub mod selective;
pub mod tone;

pub use balance::{ColorBalance, apply_color_balance};
pub use bands::{Band, BandProperty, ColorRange};
pub use selective::{BandAdjustment, SelectiveColorState, apply_selective};
pub use tone::{apply_contrast, apply_exposure, apply_saturation};
