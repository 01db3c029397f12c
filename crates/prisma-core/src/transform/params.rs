//! Request parameters for one pipeline run.
//!
//! `ProcessParams` carries everything a processing request can change.
//! Tone controls arrive as a sparse name → value map and are validated
//! into [`Adjustments`] before any pixel is touched.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::EngineError;
use crate::grading::balance::ColorBalance;
use crate::grading::selective::SelectiveColorState;

/// Control names understood by [`Adjustments`].
pub mod keys {
    pub const EXPOSURE: &str = "exposure";
    pub const CONTRAST: &str = "contrast";
    pub const SATURATION: &str = "saturation";
    pub const SHARPNESS: &str = "sharpness";
    pub const SHARPEN_RADIUS: &str = "sharpen_radius";
    pub const SHARPEN_THRESHOLD: &str = "sharpen_threshold";
}

/// Largest magnitude any control may carry.
pub const MAX_CONTROL_MAGNITUDE: f32 = 255.0;

/// Validated tone controls. Absent and zero mean the same thing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, f32>", into = "BTreeMap<String, f32>")]
pub struct Adjustments {
    pub exposure: f32,
    pub contrast: f32,
    pub saturation: f32,
    pub sharpness: f32,
    /// Overrides [`PipelineConfig::sharpen_radius`].
    pub sharpen_radius: Option<u32>,
    /// Overrides [`PipelineConfig::sharpen_threshold`].
    pub sharpen_threshold: Option<u8>,
}

impl Adjustments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate a sparse control map. Unknown keys are ignored.
    pub fn from_map<'a, I>(controls: I) -> Result<Self, EngineError>
    where
        I: IntoIterator<Item = (&'a str, f32)>,
    {
        let mut adjustments = Self::default();
        for (key, value) in controls {
            adjustments.set(key, value)?;
        }
        Ok(adjustments)
    }

    /// Set one control by name.
    pub fn set(&mut self, key: &str, value: f32) -> Result<(), EngineError> {
        if !value.is_finite() || value.abs() > MAX_CONTROL_MAGNITUDE {
            return Err(EngineError::invalid(format!(
                "`{key}` must be a finite value within ±{MAX_CONTROL_MAGNITUDE}, got {value}"
            )));
        }
        match key {
            keys::EXPOSURE => self.exposure = value,
            keys::CONTRAST => self.contrast = value,
            keys::SATURATION => self.saturation = value,
            keys::SHARPNESS => self.sharpness = value,
            keys::SHARPEN_RADIUS => self.sharpen_radius = Some(non_negative(key, value)? as u32),
            keys::SHARPEN_THRESHOLD => {
                self.sharpen_threshold = Some(non_negative(key, value)?.min(255.0) as u8)
            }
            other => debug!(key = other, "ignoring unknown adjustment"),
        }
        Ok(())
    }

    /// Whether no stage will change the buffer.
    pub fn is_identity(&self) -> bool {
        self.exposure == 0.0
            && self.contrast == 0.0
            && self.saturation == 0.0
            && self.sharpness <= 0.0
    }

    /// Unsharp-mask settings, or `None` when sharpening is off.
    ///
    /// `sharpness > 0` maps to `amount = sharpness / 100`.
    pub fn sharpen(&self, config: &PipelineConfig) -> Option<SharpenParams> {
        (self.sharpness > 0.0).then(|| SharpenParams {
            amount: self.sharpness / 100.0,
            radius: self.sharpen_radius.unwrap_or(config.sharpen_radius),
            threshold: self.sharpen_threshold.unwrap_or(config.sharpen_threshold),
        })
    }
}

fn non_negative(key: &str, value: f32) -> Result<f32, EngineError> {
    if value < 0.0 {
        return Err(EngineError::invalid(format!(
            "`{key}` must not be negative, got {value}"
        )));
    }
    Ok(value.round())
}

impl TryFrom<BTreeMap<String, f32>> for Adjustments {
    type Error = EngineError;

    fn try_from(map: BTreeMap<String, f32>) -> Result<Self, Self::Error> {
        Self::from_map(map.iter().map(|(k, &v)| (k.as_str(), v)))
    }
}

impl From<Adjustments> for BTreeMap<String, f32> {
    fn from(a: Adjustments) -> Self {
        let mut map = BTreeMap::new();
        for (key, value) in [
            (keys::EXPOSURE, a.exposure),
            (keys::CONTRAST, a.contrast),
            (keys::SATURATION, a.saturation),
            (keys::SHARPNESS, a.sharpness),
        ] {
            if value != 0.0 {
                map.insert(key.to_string(), value);
            }
        }
        if let Some(radius) = a.sharpen_radius {
            map.insert(keys::SHARPEN_RADIUS.to_string(), radius as f32);
        }
        if let Some(threshold) = a.sharpen_threshold {
            map.insert(keys::SHARPEN_THRESHOLD.to_string(), threshold as f32);
        }
        map
    }
}

/// Resolved unsharp-mask settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SharpenParams {
    pub amount: f32,
    pub radius: u32,
    pub threshold: u8,
}

/// Defaults that apply when a request leaves a setting out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub sharpen_radius: u32,
    pub sharpen_threshold: u8,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sharpen_radius: 1,
            sharpen_threshold: 3,
        }
    }
}

/// Everything one processing request can change.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessParams {
    pub adjustments: Adjustments,
    #[serde(default)]
    pub selective: SelectiveColorState,
    #[serde(default)]
    pub balance: ColorBalance,
}

impl ProcessParams {
    pub fn new(adjustments: Adjustments) -> Self {
        Self {
            adjustments,
            ..Default::default()
        }
    }

    pub fn with_selective(mut self, selective: SelectiveColorState) -> Self {
        self.selective = selective;
        self
    }

    pub fn with_balance(mut self, balance: ColorBalance) -> Self {
        self.balance = balance.clamped();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_map_sets_known_and_ignores_unknown() {
        let controls = [("exposure", 40.0), ("vibrance", 12.0), ("contrast", -5.0)];
        let adj = Adjustments::from_map(controls).unwrap();
        assert_eq!(adj.exposure, 40.0);
        assert_eq!(adj.contrast, -5.0);
        assert_eq!(adj.saturation, 0.0);
    }

    #[test]
    fn test_rejects_non_finite_and_out_of_range() {
        assert!(Adjustments::from_map([("exposure", f32::NAN)]).is_err());
        assert!(Adjustments::from_map([("contrast", 300.0)]).is_err());
        assert!(Adjustments::from_map([("unknown", 1e9)]).is_err());
        assert!(Adjustments::from_map([("sharpen_radius", -1.0)]).is_err());
    }

    #[test]
    fn test_zero_and_absent_are_equivalent() {
        let zero = Adjustments::from_map([("exposure", 0.0), ("sharpness", 0.0)]).unwrap();
        assert_eq!(zero, Adjustments::default());
        assert!(zero.is_identity());
    }

    #[test]
    fn test_sharpen_uses_config_defaults() {
        let config = PipelineConfig::default();
        assert!(Adjustments::default().sharpen(&config).is_none());
        let negative = Adjustments::from_map([("sharpness", -20.0)]).unwrap();
        assert!(negative.sharpen(&config).is_none());

        let half = Adjustments::from_map([("sharpness", 50.0)]).unwrap();
        let s = half.sharpen(&config).unwrap();
        assert_eq!((s.amount, s.radius, s.threshold), (0.5, 1, 3));

        let controls = [
            ("sharpness", 100.0),
            ("sharpen_radius", 3.0),
            ("sharpen_threshold", 10.0),
        ];
        let full = Adjustments::from_map(controls).unwrap();
        let s = full.sharpen(&config).unwrap();
        assert_eq!((s.radius, s.threshold), (3, 10));
    }

    #[test]
    fn test_deserialize_from_json_map() {
        let json = r#"{"adjustments": {"saturation": 25, "exposure": -10}}"#;
        let params: ProcessParams = serde_json::from_str(json).unwrap();
        assert_eq!(params.adjustments.saturation, 25.0);
        assert_eq!(params.adjustments.exposure, -10.0);
        assert!(!params.selective.has_active_changes());

        let bad = serde_json::from_str::<ProcessParams>(r#"{"adjustments": {"exposure": 1000}}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn test_serialize_omits_zero_controls() {
        let adj = Adjustments::from_map([("contrast", 15.0)]).unwrap();
        let json = serde_json::to_value(adj).unwrap();
        assert_eq!(json, serde_json::json!({"contrast": 15.0}));
    }
}
