//! Parameter types for pipeline operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the orchestrator (which decides what to render) and the
//! [`backend`](super::backend) (which does the pixel work), so a mock backend
//! can stand in without changing orchestration logic.
//!
//! ## Types
//!
//! - [`Quality`]: Lossy encoding quality in `[0.5, 1.0]`, default `0.92`. Clamped on construction.
//! - [`Opacity`]: Texture layer alpha in `[0, 1]`, built from a 0–100 slider value.
//! - [`ToneParameters`]: Brightness / contrast / saturation multipliers, `1.0` = identity.
//! - [`CompositeParams`]: Pass 1 inputs: target size, pixel ratio, blend mode, opacity.
//! - [`EncodeParams`]: Output format, optional quality, suggested filename.

use crate::types::{BlendMode, OutputFormat};
use serde::{Deserialize, Serialize};

/// Quality setting for lossy encoding, `0.5..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quality(f32);

impl Quality {
    pub const MIN: f32 = 0.5;
    pub const MAX: f32 = 1.0;

    /// Clamp into range. Non-finite input falls back to the default.
    pub fn new(value: f32) -> Self {
        if value.is_finite() {
            Self(value.clamp(Self::MIN, Self::MAX))
        } else {
            Self::default()
        }
    }

    pub fn value(self) -> f32 {
        self.0
    }

    /// Quality on the 1–100 scale used by the codec APIs.
    pub fn percent(self) -> u8 {
        (self.0 * 100.0).round().clamp(1.0, 100.0) as u8
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(0.92)
    }
}

/// Global alpha applied to the texture layer.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Opacity(f32);

impl Opacity {
    pub const OPAQUE: Opacity = Opacity(1.0);
    pub const TRANSPARENT: Opacity = Opacity(0.0);

    pub fn new(value: f32) -> Self {
        if value.is_finite() {
            Self(value.clamp(0.0, 1.0))
        } else {
            Self::OPAQUE
        }
    }

    /// Slider value 0–100 mapped by ÷100.
    pub fn from_percent(percent: f32) -> Self {
        Self::new(percent / 100.0)
    }

    pub fn value(self) -> f32 {
        self.0
    }
}

impl Default for Opacity {
    fn default() -> Self {
        Self::OPAQUE
    }
}

/// Brightness, contrast and saturation multipliers.
///
/// `1.0` is identity for each. Values are conventionally within `[0, 2]`
/// (slider max 200 → 2.0×) but anything non-negative is accepted. Negative
/// input is clamped to zero by [`ToneParameters::new`]; the raw fields stay
/// private so a negative value can never reach the pixel transform.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToneParameters {
    brightness: f32,
    contrast: f32,
    saturation: f32,
}

impl ToneParameters {
    pub const IDENTITY: ToneParameters = ToneParameters {
        brightness: 1.0,
        contrast: 1.0,
        saturation: 1.0,
    };

    pub fn new(brightness: f32, contrast: f32, saturation: f32) -> Self {
        Self {
            brightness: non_negative(brightness),
            contrast: non_negative(contrast),
            saturation: non_negative(saturation),
        }
    }

    /// Build from slider percentages (`100` = identity).
    pub fn from_percent(brightness: f32, contrast: f32, saturation: f32) -> Self {
        Self::new(
            non_negative(brightness) / 100.0,
            non_negative(contrast) / 100.0,
            non_negative(saturation) / 100.0,
        )
    }

    pub fn brightness(&self) -> f32 {
        self.brightness
    }

    pub fn contrast(&self) -> f32 {
        self.contrast
    }

    pub fn saturation(&self) -> f32 {
        self.saturation
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }
}

impl Default for ToneParameters {
    fn default() -> Self {
        Self::IDENTITY
    }
}

fn non_negative(v: f32) -> f32 {
    if v.is_finite() { v.max(0.0) } else { 0.0 }
}

/// Parameters for the compositing pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompositeParams {
    /// Target size in logical pixels.
    pub width: u32,
    pub height: u32,
    /// Multiplier applied to the working surface (1 or the device ratio).
    pub pixel_ratio: f32,
    pub blend_mode: BlendMode,
    pub opacity: Opacity,
}

/// Parameters for the encode step.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodeParams {
    pub format: OutputFormat,
    /// Ignored for PNG; [`EncodeParams::new`] drops it for lossless formats.
    pub quality: Option<Quality>,
    pub filename: String,
}

impl EncodeParams {
    pub fn new(format: OutputFormat, quality: Option<Quality>, filename: impl Into<String>) -> Self {
        let quality = if format.is_lossy() {
            Some(quality.unwrap_or_default())
        } else {
            None
        };
        Self {
            format,
            quality,
            filename: filename.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_clamps_to_valid_range() {
        assert_eq!(Quality::new(0.1).value(), 0.5);
        assert_eq!(Quality::new(0.75).value(), 0.75);
        assert_eq!(Quality::new(3.0).value(), 1.0);
        assert_eq!(Quality::new(f32::NAN), Quality::default());
    }

    #[test]
    fn quality_default_is_092() {
        assert_eq!(Quality::default().value(), 0.92);
        assert_eq!(Quality::default().percent(), 92);
    }

    #[test]
    fn opacity_from_slider() {
        assert_eq!(Opacity::from_percent(0.0), Opacity::TRANSPARENT);
        assert_eq!(Opacity::from_percent(100.0), Opacity::OPAQUE);
        assert_eq!(Opacity::from_percent(50.0).value(), 0.5);
        assert_eq!(Opacity::from_percent(150.0), Opacity::OPAQUE);
        assert_eq!(Opacity::from_percent(-5.0), Opacity::TRANSPARENT);
    }

    #[test]
    fn tone_negative_values_clamp_to_zero() {
        let tone = ToneParameters::new(-1.0, 0.5, -0.2);
        assert_eq!(tone.brightness(), 0.0);
        assert_eq!(tone.contrast(), 0.5);
        assert_eq!(tone.saturation(), 0.0);
    }

    #[test]
    fn tone_from_percent_maps_slider_scale() {
        let tone = ToneParameters::from_percent(100.0, 200.0, 50.0);
        assert_eq!(tone.brightness(), 1.0);
        assert_eq!(tone.contrast(), 2.0);
        assert_eq!(tone.saturation(), 0.5);
        assert!(ToneParameters::from_percent(100.0, 100.0, 100.0).is_identity());
    }

    #[test]
    fn encode_params_drop_quality_for_png() {
        let params = EncodeParams::new(OutputFormat::Png, Some(Quality::new(0.5)), "x.png");
        assert_eq!(params.quality, None);
    }

    #[test]
    fn encode_params_default_quality_for_lossy() {
        let params = EncodeParams::new(OutputFormat::Jpeg, None, "x.jpg");
        assert_eq!(params.quality, Some(Quality::default()));
    }
}
