//! Hue bands for selective color grading.
//!
//! Bands are a closed enumeration so per-pixel code indexes fixed arrays
//! instead of looking values up by name.

use std::f32::consts::FRAC_PI_2;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::color_management::hue_distance;
use crate::error::EngineError;

/// One of the nine selective-color bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Band {
    /// Global adjustment applied to every pixel before the color bands.
    All,
    Red,
    Orange,
    Yellow,
    Green,
    Aqua,
    Blue,
    Purple,
    Magenta,
}

impl Band {
    /// Number of bands including [`Band::All`].
    pub const COUNT: usize = 9;

    /// Every band in storage order.
    pub const ALL_BANDS: [Band; Self::COUNT] = [
        Band::All,
        Band::Red,
        Band::Orange,
        Band::Yellow,
        Band::Green,
        Band::Aqua,
        Band::Blue,
        Band::Purple,
        Band::Magenta,
    ];

    /// The eight hue-targeted bands, in processing order.
    pub const COLORS: [Band; 8] = [
        Band::Red,
        Band::Orange,
        Band::Yellow,
        Band::Green,
        Band::Aqua,
        Band::Blue,
        Band::Purple,
        Band::Magenta,
    ];

    /// Array index for per-band storage.
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Lowercase name used on the wire and in the caller API.
    pub const fn name(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Red => "red",
            Self::Orange => "orange",
            Self::Yellow => "yellow",
            Self::Green => "green",
            Self::Aqua => "aqua",
            Self::Blue => "blue",
            Self::Purple => "purple",
            Self::Magenta => "magenta",
        }
    }

    /// Hue range targeted by this band. `None` for [`Band::All`].
    pub fn range(self) -> Option<&'static ColorRange> {
        match self {
            Self::All => None,
            _ => Some(&COLOR_RANGES[self.index() - 1]),
        }
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Band {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL_BANDS
            .into_iter()
            .find(|b| b.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| EngineError::invalid(format!("unknown color band `{s}`")))
    }
}

/// Which component of a band's triple to change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BandProperty {
    Hue,
    Saturation,
    Luminance,
}

impl BandProperty {
    pub const ALL: [BandProperty; 3] = [Self::Hue, Self::Saturation, Self::Luminance];
}

impl FromStr for BandProperty {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "hue" => Ok(Self::Hue),
            "saturation" => Ok(Self::Saturation),
            "luminance" => Ok(Self::Luminance),
            _ => Err(EngineError::invalid(format!("unknown band property `{s}`"))),
        }
    }
}

/// Angular footprint of a color band.
///
/// Pixels within `primary / 2` degrees of `center` get full weight; the
/// weight then eases to zero over `falloff` more degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorRange {
    /// Band center hue in degrees.
    pub center: f32,
    /// Full-weight arc width in degrees.
    pub primary: f32,
    /// Width of the cosine falloff beyond the primary arc, in degrees.
    pub falloff: f32,
}

/// Static band table, in [`Band::COLORS`] order.
pub static COLOR_RANGES: [ColorRange; 8] = [
    ColorRange::new(0.0, 30.0, 15.0),
    ColorRange::new(30.0, 30.0, 15.0),
    ColorRange::new(60.0, 30.0, 15.0),
    ColorRange::new(120.0, 60.0, 20.0),
    ColorRange::new(180.0, 30.0, 15.0),
    ColorRange::new(240.0, 60.0, 20.0),
    ColorRange::new(270.0, 30.0, 15.0),
    ColorRange::new(315.0, 30.0, 15.0),
];

/// Saturation at and above which a pixel counts fully toward color bands.
pub const FULL_WEIGHT_SATURATION: f32 = 0.3;

impl ColorRange {
    pub const fn new(center: f32, primary: f32, falloff: f32) -> Self {
        Self {
            center,
            primary,
            falloff,
        }
    }

    /// Hue-only membership in `[0, 1]`.
    ///
    /// ```text
    /// d = shortest angle(hue, center)
    /// d ≤ primary/2            → 1
    /// d ≤ primary/2 + falloff  → cos(π/2 · (d − primary/2) / falloff)
    /// otherwise                → 0
    /// ```
    pub fn hue_weight(&self, hue: f32) -> f32 {
        let half = self.primary * 0.5;
        let d = hue_distance(hue, self.center);
        if d <= half {
            1.0
        } else if d <= half + self.falloff {
            let excess = d - half;
            let angle = FRAC_PI_2 * excess / self.falloff;
            angle.cos().max(0.0)
        } else {
            0.0
        }
    }

    /// Full band weight: hue membership scaled linearly by saturation.
    ///
    /// Achromatic pixels get zero weight, so hue-targeted bands never
    /// tint grays.
    pub fn weight(&self, hue: f32, saturation: f32) -> f32 {
        self.hue_weight(hue) * saturation_weight(saturation)
    }
}

/// Linear saturation ramp: `min(1, s / 0.3)`.
#[inline]
pub fn saturation_weight(saturation: f32) -> f32 {
    (saturation / FULL_WEIGHT_SATURATION).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_1_SQRT_2;

    const EPSILON: f32 = 1e-5;

    #[test]
    fn test_indices_follow_declaration_order() {
        for (i, band) in Band::ALL_BANDS.iter().enumerate() {
            assert_eq!(band.index(), i);
        }
        assert_eq!(Band::COLORS[0].index(), 1);
    }

    #[test]
    fn test_parse_band_and_property() {
        assert_eq!("Aqua".parse::<Band>().unwrap(), Band::Aqua);
        assert_eq!("all".parse::<Band>().unwrap(), Band::All);
        assert!("teal".parse::<Band>().is_err());
        let property: BandProperty = "luminance".parse().unwrap();
        assert_eq!(property, BandProperty::Luminance);
        assert!("lightness".parse::<BandProperty>().is_err());
    }

    #[test]
    fn test_all_band_has_no_range() {
        assert!(Band::All.range().is_none());
        assert_eq!(Band::Green.range().unwrap().center, 120.0);
        assert_eq!(Band::Magenta.range().unwrap().center, 315.0);
    }

    #[test]
    fn test_hue_weight_full_inside_primary_arc() {
        let red = Band::Red.range().unwrap();
        assert_eq!(red.hue_weight(0.0), 1.0);
        assert_eq!(red.hue_weight(15.0), 1.0);
        assert_eq!(red.hue_weight(345.0), 1.0);
    }

    #[test]
    fn test_hue_weight_cosine_falloff() {
        let red = Band::Red.range().unwrap();
        // Halfway through the 15° falloff: cos(π/4).
        let w = red.hue_weight(22.5);
        assert!((w - FRAC_1_SQRT_2).abs() < EPSILON, "{w}");
        assert!(red.hue_weight(29.99) < 0.01);
        assert_eq!(red.hue_weight(31.0), 0.0);
        assert_eq!(red.hue_weight(180.0), 0.0);
    }

    #[test]
    fn test_weight_scales_with_saturation() {
        let blue = Band::Blue.range().unwrap();
        assert_eq!(blue.weight(240.0, 0.0), 0.0);
        assert!((blue.weight(240.0, 0.15) - 0.5).abs() < EPSILON);
        assert_eq!(blue.weight(240.0, 0.9), 1.0);
    }
}
