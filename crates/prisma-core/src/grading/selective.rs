//! Selective color grading: per-hue-band hue/saturation/luminance offsets.
//!
//! # Algorithm
//! For each pixel:
//! 1. Convert to HSL.
//! 2. If the `all` band is active, shift hue by `v × 1.8°` and scale
//!    saturation and lightness by `1 + v/100` (clamped to `[0, 1]`).
//! 3. For each active color band, in [`Band::COLORS`] order, compute the
//!    pixel's membership weight from its input hue and saturation (see
//!    [`ColorRange::weight`]). Weights below `0.01` skip the band.
//!    Otherwise:
//!    ```text
//!    hue += v_h / 100 × 30° × w                        (wrapped to [0, 360))
//!    sat *= 1 + v_s / 100 × w × 1.0                    (clamped to [0, 1])
//!    lum *= 1 + v_l / 100 × w × 1.0                    (clamped to [0, 1])
//!    ```
//! 4. Convert back to RGB and round.
//!
//! Bands select on the input color, so a global shift never moves a pixel
//! into or out of a band. Deltas accumulate on the running HSL value.
//! Pixels no band touched keep their original bytes.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::color_management::{hsl_to_rgb, normalize_hue, rgb_to_hsl};
use crate::error::EngineError;
use crate::grading::bands::{Band, BandProperty, ColorRange};
use crate::image::{PixelBuffer, to_channel};

/// Largest hue rotation a color band can apply, in degrees (at ±100).
pub const MAX_HUE_SWING_DEGREES: f32 = 30.0;

/// Degrees of global hue rotation per unit of the `all` band's hue value.
pub const GLOBAL_HUE_DEGREES_PER_UNIT: f32 = 1.8;

/// Scale on band saturation deltas.
pub const SATURATION_DAMPENING: f32 = 1.0;

/// Scale on band luminance deltas.
pub const LUMINANCE_DAMPENING: f32 = 1.0;

/// Band weights below this are treated as zero.
pub const WEIGHT_EPSILON: f32 = 0.01;

/// Bounds for every band value.
pub const BAND_VALUE_RANGE: (f32, f32) = (-100.0, 100.0);

/// One band's `{hue, saturation, luminance}` offsets, each in `[-100, 100]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BandAdjustment {
    #[serde(default)]
    pub hue: f32,
    #[serde(default)]
    pub saturation: f32,
    #[serde(default)]
    pub luminance: f32,
}

impl BandAdjustment {
    /// Whether all three offsets are zero.
    pub fn is_zero(&self) -> bool {
        self.hue == 0.0 && self.saturation == 0.0 && self.luminance == 0.0
    }

    /// Read one component.
    pub fn get(&self, property: BandProperty) -> f32 {
        match property {
            BandProperty::Hue => self.hue,
            BandProperty::Saturation => self.saturation,
            BandProperty::Luminance => self.luminance,
        }
    }

    fn clamped(self) -> Self {
        Self {
            hue: clamp_band_value(self.hue),
            saturation: clamp_band_value(self.saturation),
            luminance: clamp_band_value(self.luminance),
        }
    }
}

/// The nine-band selective color state.
///
/// Created with every triple at zero. Values only change through the
/// setters, which clamp to `[-100, 100]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "SelectiveColorMap", into = "SelectiveColorMap")]
pub struct SelectiveColorState {
    bands: [BandAdjustment; Band::COUNT],
}

impl SelectiveColorState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set one component of one band. The value is clamped to `[-100, 100]`.
    pub fn set_band_value(
        &mut self,
        band: Band,
        property: BandProperty,
        value: f32,
    ) -> Result<(), EngineError> {
        if !value.is_finite() {
            return Err(EngineError::invalid(format!(
                "{band} {property:?} must be finite, got {value}"
            )));
        }
        let slot = &mut self.bands[band.index()];
        let value = clamp_band_value(value);
        match property {
            BandProperty::Hue => slot.hue = value,
            BandProperty::Saturation => slot.saturation = value,
            BandProperty::Luminance => slot.luminance = value,
        }
        Ok(())
    }

    /// String-keyed variant of [`set_band_value`](Self::set_band_value).
    pub fn set_band_value_by_name(
        &mut self,
        band: &str,
        property: &str,
        value: f32,
    ) -> Result<(), EngineError> {
        self.set_band_value(band.parse()?, property.parse()?, value)
    }

    /// Replace a whole band triple (clamped). Non-finite components are
    /// rejected and leave the band unchanged.
    pub fn set_band(
        &mut self,
        band: Band,
        adjustment: BandAdjustment,
    ) -> Result<(), EngineError> {
        for property in BandProperty::ALL {
            let value = adjustment.get(property);
            if !value.is_finite() {
                return Err(EngineError::invalid(format!(
                    "{band} {property:?} must be finite, got {value}"
                )));
            }
        }
        self.bands[band.index()] = adjustment.clamped();
        Ok(())
    }

    /// Current triple for one band.
    pub fn band(&self, band: Band) -> BandAdjustment {
        self.bands[band.index()]
    }

    /// All nine triples in [`Band::ALL_BANDS`] order.
    pub fn values(&self) -> &[BandAdjustment; Band::COUNT] {
        &self.bands
    }

    /// Copy every band from another state.
    pub fn set_values(&mut self, other: &SelectiveColorState) {
        self.bands = other.bands;
    }

    /// Zero every band.
    pub fn reset(&mut self) {
        self.bands = [BandAdjustment::default(); Band::COUNT];
    }

    /// `false` when every band is zero, in which case grading is the identity.
    pub fn has_active_changes(&self) -> bool {
        self.bands.iter().any(|b| !b.is_zero())
    }
}

/// Apply the selective color grade in place.
///
/// Returns without touching the buffer when no band is active.
pub fn apply_selective(buffer: &mut PixelBuffer, state: &SelectiveColorState) {
    if !state.has_active_changes() {
        return;
    }

    let global = state.band(Band::All);
    let global = (!global.is_zero()).then_some(global);
    let active: Vec<(&ColorRange, BandAdjustment)> = Band::COLORS
        .iter()
        .filter_map(|&band| {
            let adj = state.band(band);
            let range = band.range()?;
            (!adj.is_zero()).then_some((range, adj))
        })
        .collect();

    debug!(
        global = global.is_some(),
        color_bands = active.len(),
        "selective color pass"
    );

    for px in buffer.pixels_mut() {
        if let Some([r, g, b]) = grade_pixel(px[0], px[1], px[2], global, &active) {
            px[0] = r;
            px[1] = g;
            px[2] = b;
        }
    }
}

/// Grade one pixel. `None` means no band affected it.
fn grade_pixel(
    r: u8,
    g: u8,
    b: u8,
    global: Option<BandAdjustment>,
    bands: &[(&ColorRange, BandAdjustment)],
) -> Option<[u8; 3]> {
    let (mut hue, mut sat, mut lum) = rgb_to_hsl(r, g, b);
    let (select_hue, select_sat) = (hue, sat);
    let mut changed = false;

    if let Some(all) = global {
        if all.hue != 0.0 {
            hue = normalize_hue(hue + all.hue * GLOBAL_HUE_DEGREES_PER_UNIT);
        }
        if all.saturation != 0.0 {
            sat = (sat * (1.0 + all.saturation / 100.0)).clamp(0.0, 1.0);
        }
        if all.luminance != 0.0 {
            lum = (lum * (1.0 + all.luminance / 100.0)).clamp(0.0, 1.0);
        }
        changed = true;
    }

    for (range, adj) in bands {
        let weight = range.weight(select_hue, select_sat);
        if weight < WEIGHT_EPSILON {
            continue;
        }
        if adj.hue != 0.0 {
            hue = normalize_hue(hue + adj.hue / 100.0 * MAX_HUE_SWING_DEGREES * weight);
        }
        if adj.saturation != 0.0 {
            let factor = 1.0 + adj.saturation / 100.0 * weight * SATURATION_DAMPENING;
            sat = (sat * factor).clamp(0.0, 1.0);
        }
        if adj.luminance != 0.0 {
            let factor = 1.0 + adj.luminance / 100.0 * weight * LUMINANCE_DAMPENING;
            lum = (lum * factor).clamp(0.0, 1.0);
        }
        changed = true;
    }

    if !changed {
        return None;
    }
    let [r, g, b] = hsl_to_rgb(hue, sat, lum);
    Some([to_channel(r), to_channel(g), to_channel(b)])
}

/// Clamp to [`BAND_VALUE_RANGE`]. NaN maps to zero.
fn clamp_band_value(value: f32) -> f32 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(BAND_VALUE_RANGE.0, BAND_VALUE_RANGE.1)
}

/// Named-field form of [`SelectiveColorState`] used for serialization.
///
/// Missing bands default to zero.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct SelectiveColorMap {
    #[serde(default)]
    all: BandAdjustment,
    #[serde(default)]
    red: BandAdjustment,
    #[serde(default)]
    orange: BandAdjustment,
    #[serde(default)]
    yellow: BandAdjustment,
    #[serde(default)]
    green: BandAdjustment,
    #[serde(default)]
    aqua: BandAdjustment,
    #[serde(default)]
    blue: BandAdjustment,
    #[serde(default)]
    purple: BandAdjustment,
    #[serde(default)]
    magenta: BandAdjustment,
}

impl From<SelectiveColorMap> for SelectiveColorState {
    fn from(m: SelectiveColorMap) -> Self {
        let bands = [
            m.all, m.red, m.orange, m.yellow, m.green, m.aqua, m.blue, m.purple, m.magenta,
        ];
        Self {
            bands: bands.map(BandAdjustment::clamped),
        }
    }
}

impl From<SelectiveColorState> for SelectiveColorMap {
    fn from(s: SelectiveColorState) -> Self {
        let [all, red, orange, yellow, green, aqua, blue, purple, magenta] = s.bands;
        Self {
            all,
            red,
            orange,
            yellow,
            green,
            aqua,
            blue,
            purple,
            magenta,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Hue wheel plus grays: red, orange, yellow, green, aqua, blue, purple, magenta, gray, white.
    fn palette() -> PixelBuffer {
        PixelBuffer::from_pixels(
            5,
            2,
            &[
                [220, 30, 30, 255],
                [230, 130, 20, 200],
                [240, 230, 40, 255],
                [40, 200, 60, 255],
                [30, 200, 210, 255],
                [30, 40, 220, 255],
                [130, 40, 220, 255],
                [220, 30, 160, 255],
                [128, 128, 128, 255],
                [255, 255, 255, 0],
            ],
        )
        .unwrap()
    }

    fn single(band: Band, property: BandProperty, value: f32) -> SelectiveColorState {
        let mut state = SelectiveColorState::new();
        state.set_band_value(band, property, value).unwrap();
        state
    }

    fn graded(state: &SelectiveColorState, rgba: [u8; 4]) -> [u8; 4] {
        let mut buf = PixelBuffer::from_pixels(1, 1, &[rgba]).unwrap();
        apply_selective(&mut buf, state);
        buf.pixel(0, 0)
    }

    #[test]
    fn test_zero_state_is_identity() {
        let state = SelectiveColorState::new();
        assert!(!state.has_active_changes());
        let mut buf = palette();
        apply_selective(&mut buf, &state);
        assert_eq!(buf, palette());
    }

    #[test]
    fn test_setters_clamp_and_reset() {
        let mut state = single(Band::Red, BandProperty::Hue, 250.0);
        let blue = BandAdjustment {
            luminance: -130.0,
            ..Default::default()
        };
        state.set_band(Band::Blue, blue).unwrap();
        assert_eq!(state.band(Band::Red).hue, 100.0);
        assert_eq!(state.band(Band::Blue).luminance, -100.0);
        assert!(state.has_active_changes());

        state.reset();
        assert!(!state.has_active_changes());
        assert_eq!(state.values().len(), 9);
    }

    #[test]
    fn test_set_by_name_rejects_unknown() {
        let mut state = SelectiveColorState::new();
        state
            .set_band_value_by_name("green", "saturation", 20.0)
            .unwrap();
        assert_eq!(state.band(Band::Green).saturation, 20.0);
        assert!(state.set_band_value_by_name("cyan", "hue", 1.0).is_err());
        assert!(state.set_band_value_by_name("red", "gamma", 1.0).is_err());
        let nan = state.set_band_value(Band::Red, BandProperty::Hue, f32::NAN);
        assert!(nan.is_err());
    }

    #[test]
    fn test_set_band_rejects_non_finite() {
        let mut state = single(Band::All, BandProperty::Luminance, 10.0);
        let before = state.band(Band::All);
        let nan_hue = BandAdjustment {
            hue: f32::NAN,
            ..Default::default()
        };
        assert!(state.set_band(Band::All, nan_hue).is_err());
        let infinite = BandAdjustment {
            saturation: f32::INFINITY,
            ..Default::default()
        };
        assert!(state.set_band(Band::All, infinite).is_err());
        assert_eq!(state.band(Band::All), before);

        let rgba = [200, 120, 40, 255];
        let expected = graded(&single(Band::All, BandProperty::Luminance, 10.0), rgba);
        assert_eq!(graded(&state, rgba), expected);
        assert_eq!(clamp_band_value(f32::NAN), 0.0);
    }

    #[test]
    fn test_red_saturation_only_touches_red_pixels() {
        let state = single(Band::Red, BandProperty::Saturation, -100.0);

        let mut buf = palette();
        apply_selective(&mut buf, &state);

        let [r, g, b, a] = buf.pixel(0, 0);
        assert_eq!(r, g, "red pixel should be fully desaturated");
        assert_eq!(g, b);
        assert_eq!(a, 255);

        let original = palette();
        for (x, y) in [(2, 0), (3, 0), (4, 0), (0, 1), (1, 1), (3, 1), (4, 1)] {
            let (now, before) = (buf.pixel(x, y), original.pixel(x, y));
            assert_eq!(now, before, "pixel ({x},{y}) changed");
        }
    }

    #[test]
    fn test_grays_ignore_color_bands() {
        let mut state = SelectiveColorState::new();
        let adjustment = BandAdjustment {
            hue: 80.0,
            saturation: 0.0,
            luminance: 80.0,
        };
        for band in Band::COLORS {
            state.set_band(band, adjustment).unwrap();
        }
        let mut buf = palette();
        apply_selective(&mut buf, &state);
        assert_eq!(buf.pixel(3, 1), [128, 128, 128, 255]);
        assert_eq!(buf.pixel(4, 1), [255, 255, 255, 0]);
    }

    #[test]
    fn test_color_bands_select_on_input_color() {
        let mut state = single(Band::All, BandProperty::Saturation, -100.0);
        let desaturated = graded(&state, [200, 40, 40, 255]);
        assert_eq!(desaturated, [120, 120, 120, 255]);

        // The pixel is gray after the global pass but was red on input.
        state
            .set_band_value(Band::Red, BandProperty::Luminance, 50.0)
            .unwrap();
        let [r, g, b, _] = graded(&state, [200, 40, 40, 255]);
        assert_eq!((r, g), (g, b));
        assert!(r > 170, "expected the red band to brighten, got {r}");

        // A global hue swing does not pull a blue pixel into the red band.
        let mut state = single(Band::All, BandProperty::Hue, 70.0);
        let rotated = graded(&state, [30, 40, 220, 255]);
        state
            .set_band_value(Band::Red, BandProperty::Luminance, 100.0)
            .unwrap();
        assert_eq!(graded(&state, [30, 40, 220, 255]), rotated);
    }

    #[test]
    fn test_blue_hue_shift_is_bounded_by_swing() {
        let state = single(Band::Blue, BandProperty::Hue, 100.0);
        let [r, g, b, _] = graded(&state, [0, 0, 255, 255]);
        let (h, _, _) = rgb_to_hsl(r, g, b);
        assert!((h - 270.0).abs() < 1.0, "expected ~270°, got {h}");
    }

    #[test]
    fn test_all_band_luminance_brightens_everything() {
        let state = single(Band::All, BandProperty::Luminance, 50.0);
        assert_eq!(graded(&state, [40, 40, 40, 255]), [60, 60, 60, 255]);
        assert!(graded(&state, [100, 20, 20, 255])[0] > 100);
    }

    #[test]
    fn test_all_band_hue_wraps_past_360() {
        // 100 × 1.8° = 180°: red becomes cyan.
        let state = single(Band::All, BandProperty::Hue, 100.0);
        assert_eq!(graded(&state, [255, 0, 0, 255]), [0, 255, 255, 255]);
    }

    #[test]
    fn test_state_serializes_by_band_name() {
        let state = single(Band::Aqua, BandProperty::Hue, -12.0);
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["aqua"]["hue"], -12.0);
        assert_eq!(json["all"]["saturation"], 0.0);

        let json = r#"{"magenta": {"luminance": 500}}"#;
        let parsed: SelectiveColorState = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.band(Band::Magenta).luminance, 100.0);
        assert_eq!(parsed.band(Band::Red), BandAdjustment::default());
    }
}
