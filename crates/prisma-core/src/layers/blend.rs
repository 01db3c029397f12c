//! Blend mode formulas on normalized `[0, 1]` channels.
//!
//! `base` is the accumulated color underneath, `top` the layer color.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// How a layer's color combines with the pixels beneath it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlendMode {
    #[default]
    Normal,
    Multiply,
    Screen,
    Overlay,
    HardLight,
    SoftLight,
}

impl BlendMode {
    pub const ALL: [BlendMode; 6] = [
        BlendMode::Normal,
        BlendMode::Multiply,
        BlendMode::Screen,
        BlendMode::Overlay,
        BlendMode::HardLight,
        BlendMode::SoftLight,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Multiply => "multiply",
            Self::Screen => "screen",
            Self::Overlay => "overlay",
            Self::HardLight => "hard-light",
            Self::SoftLight => "soft-light",
        }
    }

    /// Blend one channel.
    #[inline]
    pub fn blend(self, base: f32, top: f32) -> f32 {
        match self {
            Self::Normal => top,
            Self::Multiply => base * top,
            Self::Screen => 1.0 - (1.0 - base) * (1.0 - top),
            Self::Overlay => overlay_channel(base, top),
            Self::HardLight => overlay_channel(top, base),
            Self::SoftLight => soft_light_channel(base, top),
        }
    }

    /// Blend an RGB triple.
    #[inline]
    pub fn blend_rgb(self, base: [f32; 3], top: [f32; 3]) -> [f32; 3] {
        [
            self.blend(base[0], top[0]),
            self.blend(base[1], top[1]),
            self.blend(base[2], top[2]),
        ]
    }
}

impl fmt::Display for BlendMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BlendMode {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| EngineError::invalid(format!("unknown blend mode `{s}`")))
    }
}

/// `base < 0.5 ? 2·base·top : 1 − 2(1 − base)(1 − top)`
#[inline]
fn overlay_channel(base: f32, top: f32) -> f32 {
    if base < 0.5 {
        2.0 * base * top
    } else {
        1.0 - 2.0 * (1.0 - base) * (1.0 - top)
    }
}

/// W3C soft light.
#[inline]
fn soft_light_channel(base: f32, top: f32) -> f32 {
    if top <= 0.5 {
        base - (1.0 - 2.0 * top) * base * (1.0 - base)
    } else {
        let d = if base <= 0.25 {
            ((16.0 * base - 12.0) * base + 4.0) * base
        } else {
            base.sqrt()
        };
        base + (2.0 * top - 1.0) * (d - base)
    }
}
