//! Application configuration.
//!
//! Handles loading, validating, and merging `texture-adder.toml`. Stock
//! defaults are the base layer; a user file overrides just the keys it sets,
//! and CLI flags override individual values on top of that.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [composite]
//! texture = "magazine.jpg"  # One of the bundled textures
//! blend_mode = "overlay"    # overlay|multiply|screen|darken|lighten|difference
//! opacity = 100             # Texture opacity, percent (0-100)
//!
//! [tone]
//! brightness = 100          # Percent; 100 = unchanged, 200 = 2x
//! contrast = 100
//! saturation = 100
//!
//! [output]
//! size = "original"         # original|4k|2k|1080p (cap on the longer edge)
//! format = "png"            # png|jpeg|webp
//! quality = 0.92            # 0.5-1.0, lossy formats only
//! filename = "blended-image"
//! use_device_pixel_ratio = false
//! device_pixel_ratio = 1.0
//!
//! [assets]
//! textures_dir = "textures"
//!
//! [delivery]
//! mode = "auto"             # auto|download|share
//! output_dir = "."
//! share_command = "xdg-open"
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::Quality;
use crate::loader::resolve_texture;
use crate::types::{BlendMode, OutputFormat, SizePreset};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Configuration loaded from `texture-adder.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Texture selection, blend mode and opacity.
    pub composite: CompositeConfig,
    /// Brightness / contrast / saturation sliders.
    pub tone: ToneConfig,
    /// Output size, format and naming.
    pub output: OutputConfig,
    /// Where the bundled textures live.
    pub assets: AssetsConfig,
    /// How finished exports are handed off.
    pub delivery: DeliveryConfig,
}

impl AppConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let opacity = self.composite.opacity;
        if !(0.0..=100.0).contains(&opacity) {
            return Err(ConfigError::Validation(
                "composite.opacity must be 0-100".into(),
            ));
        }
        if resolve_texture(&self.composite.texture).is_none() {
            return Err(ConfigError::Validation(format!(
                "composite.texture '{}' is not a bundled texture",
                self.composite.texture
            )));
        }
        for (name, value) in [
            ("brightness", self.tone.brightness),
            ("contrast", self.tone.contrast),
            ("saturation", self.tone.saturation),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::Validation(format!(
                    "tone.{name} must be a finite number"
                )));
            }
        }
        let quality = self.output.quality;
        if !(Quality::MIN..=Quality::MAX).contains(&quality) {
            return Err(ConfigError::Validation(
                "output.quality must be 0.5-1.0".into(),
            ));
        }
        let dpr = self.output.device_pixel_ratio;
        if !dpr.is_finite() || dpr <= 0.0 {
            return Err(ConfigError::Validation(
                "output.device_pixel_ratio must be greater than 0".into(),
            ));
        }
        if self.output.filename.trim().is_empty() {
            return Err(ConfigError::Validation(
                "output.filename must not be empty".into(),
            ));
        }
        if self.delivery.share_command.trim().is_empty() {
            return Err(ConfigError::Validation(
                "delivery.share_command must not be empty".into(),
            ));
        }
        Ok(())
    }
}

/// Texture layer settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompositeConfig {
    /// Texture file name, with or without extension (`magazine` or `magazine.jpg`).
    pub texture: String,
    pub blend_mode: BlendMode,
    /// Texture opacity in percent.
    pub opacity: f32,
}

impl Default for CompositeConfig {
    fn default() -> Self {
        Self {
            texture: "magazine.jpg".to_string(),
            blend_mode: BlendMode::Overlay,
            opacity: 100.0,
        }
    }
}

/// Tone sliders in percent. Negative values are accepted and clamp to zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToneConfig {
    pub brightness: f32,
    pub contrast: f32,
    pub saturation: f32,
}

impl Default for ToneConfig {
    fn default() -> Self {
        Self {
            brightness: 100.0,
            contrast: 100.0,
            saturation: 100.0,
        }
    }
}

/// Output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    pub size: SizePreset,
    pub format: OutputFormat,
    /// Lossy encoding quality (0.5 = smallest, 1.0 = best). Ignored for PNG.
    pub quality: f32,
    /// Base file name; the extension always follows `format`.
    pub filename: String,
    /// Render at `device_pixel_ratio` instead of 1.
    pub use_device_pixel_ratio: bool,
    /// The display's native pixel ratio.
    pub device_pixel_ratio: f32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            size: SizePreset::Original,
            format: OutputFormat::Png,
            quality: Quality::default().value(),
            filename: crate::naming::DEFAULT_BASE_NAME.to_string(),
            use_device_pixel_ratio: false,
            device_pixel_ratio: 1.0,
        }
    }
}

/// Asset locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AssetsConfig {
    pub textures_dir: PathBuf,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            textures_dir: PathBuf::from("textures"),
        }
    }
}

/// How exports are delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryMode {
    /// Share when the share command is available, otherwise download.
    #[default]
    Auto,
    Download,
    Share,
}

/// Delivery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeliveryConfig {
    pub mode: DeliveryMode,
    /// Directory downloads are written to.
    pub output_dir: PathBuf,
    /// Program handed the exported file path when sharing.
    pub share_command: String,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            mode: DeliveryMode::Auto,
            output_dir: PathBuf::from("."),
            share_command: "xdg-open".to_string(),
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(AppConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<AppConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: AppConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from the given file, falling back to stock defaults when it
/// does not exist.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(path)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock config file with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Texture Adder Configuration
# ===========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.
# Command-line flags override anything set here.

# ---------------------------------------------------------------------------
# Texture layer
# ---------------------------------------------------------------------------
[composite]
# One of: magazine.jpg, vinyl-bleed.jpg, 60s-mustard.jpg, royal-navy.jpg,
# tonor.png, heavy-grain.png (the extension may be omitted).
texture = "magazine.jpg"

# overlay, multiply, screen, darken, lighten or difference.
blend_mode = "overlay"

# Texture opacity in percent (0-100).
opacity = 100.0

# ---------------------------------------------------------------------------
# Tone, applied to the blended result (percent; 100 = unchanged)
# ---------------------------------------------------------------------------
[tone]
brightness = 100.0
contrast = 100.0
saturation = 100.0

# ---------------------------------------------------------------------------
# Output
# ---------------------------------------------------------------------------
[output]
# Cap on the longer edge: original, 4k (3840), 2k (2560) or 1080p (1920).
# Images are never upscaled.
size = "original"

# png (lossless), jpeg or webp.
format = "png"

# Lossy quality between 0.5 and 1.0. Ignored for png.
quality = 0.92

# Base file name; the extension follows the format.
filename = "blended-image"

# Render at the display's pixel ratio instead of 1x.
use_device_pixel_ratio = false
device_pixel_ratio = 1.0

# ---------------------------------------------------------------------------
# Assets
# ---------------------------------------------------------------------------
[assets]
textures_dir = "textures"

# ---------------------------------------------------------------------------
# Delivery
# ---------------------------------------------------------------------------
[delivery]
# auto: share when share_command is on PATH, otherwise save to output_dir.
mode = "auto"
output_dir = "."
share_command = "xdg-open"
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_values() {
        let config = AppConfig::default();
        assert_eq!(config.composite.texture, "magazine.jpg");
        assert_eq!(config.composite.blend_mode, BlendMode::Overlay);
        assert_eq!(config.composite.opacity, 100.0);
        assert_eq!(config.tone.brightness, 100.0);
        assert_eq!(config.output.size, SizePreset::Original);
        assert_eq!(config.output.format, OutputFormat::Png);
        assert_eq!(config.output.quality, 0.92);
        assert_eq!(config.output.filename, "blended-image");
        assert_eq!(config.delivery.mode, DeliveryMode::Auto);
    }

    #[test]
    fn parse_partial_config() {
        let config: AppConfig = toml::from_str(
            r#"
[composite]
blend_mode = "difference"
"#,
        )
        .unwrap();
        assert_eq!(config.composite.blend_mode, BlendMode::Difference);
        assert_eq!(config.composite.texture, "magazine.jpg");
        assert_eq!(config.output.format, OutputFormat::Png);
    }

    #[test]
    fn parse_output_settings() {
        let config: AppConfig = toml::from_str(
            r#"
[output]
size = "1080p"
format = "webp"
quality = 0.6
use_device_pixel_ratio = true
device_pixel_ratio = 2.0
"#,
        )
        .unwrap();
        assert_eq!(config.output.size, SizePreset::FullHd);
        assert_eq!(config.output.format, OutputFormat::Webp);
        assert_eq!(config.output.quality, 0.6);
        assert!(config.output.use_device_pixel_ratio);
        assert_eq!(config.output.device_pixel_ratio, 2.0);
    }

    // =========================================================================
    // load_config tests
    // =========================================================================

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(&tmp.path().join("texture-adder.toml")).unwrap();
        assert_eq!(config.composite.texture, "magazine.jpg");
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("texture-adder.toml");
        fs::write(
            &path,
            r#"
[composite]
texture = "tonor"
opacity = 40

[tone]
saturation = 0
"#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.composite.texture, "tonor");
        assert_eq!(config.composite.opacity, 40.0);
        assert_eq!(config.tone.saturation, 0.0);
        assert_eq!(config.tone.brightness, 100.0);
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("texture-adder.toml");
        fs::write(&path, "this is not valid toml [[[").unwrap();
        assert!(matches!(load_config(&path), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn unknown_key_rejected() {
        let result: Result<AppConfig, _> = toml::from_str(
            r#"
[output]
qualty = 0.9
"#,
        );
        let err = result.unwrap_err().to_string();
        assert!(err.contains("unknown field"));
    }

    #[test]
    fn unknown_blend_mode_rejected() {
        let result: Result<AppConfig, _> = toml::from_str(
            r#"
[composite]
blend_mode = "color-dodge"
"#,
        );
        assert!(result.is_err());
    }

    // =========================================================================
    // Validation tests
    // =========================================================================

    #[test]
    fn validate_default_config_passes() {
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn validate_opacity_range() {
        let mut config = AppConfig::default();
        config.composite.opacity = 101.0;
        assert!(config.validate().unwrap_err().to_string().contains("opacity"));
        config.composite.opacity = 0.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_quality_range() {
        let mut config = AppConfig::default();
        config.output.quality = 0.4;
        assert!(config.validate().is_err());
        config.output.quality = 1.0;
        assert!(config.validate().is_ok());
        config.output.quality = 0.5;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_unknown_texture() {
        let mut config = AppConfig::default();
        config.composite.texture = "wallpaper.jpg".into();
        assert!(config.validate().unwrap_err().to_string().contains("wallpaper"));
    }

    #[test]
    fn validate_pixel_ratio_positive() {
        let mut config = AppConfig::default();
        config.output.device_pixel_ratio = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_allows_negative_tone() {
        let mut config = AppConfig::default();
        config.tone.brightness = -20.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_empty_filename() {
        let mut config = AppConfig::default();
        config.output.filename = "  ".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_config_validates_values() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("texture-adder.toml");
        fs::write(&path, "[output]\nquality = 2.0\n").unwrap();
        assert!(matches!(load_config(&path), Err(ConfigError::Validation(_))));
    }

    // =========================================================================
    // merge_toml tests
    // =========================================================================

    #[test]
    fn merge_toml_table_merge() {
        let base: toml::Value = toml::from_str("[tone]\nbrightness = 100\ncontrast = 100\n").unwrap();
        let overlay: toml::Value = toml::from_str("[tone]\ncontrast = 150\n").unwrap();
        let merged = merge_toml(base, overlay);
        let tone = merged.get("tone").unwrap();
        assert_eq!(tone.get("contrast").unwrap().as_integer(), Some(150));
        assert_eq!(tone.get("brightness").unwrap().as_integer(), Some(100));
    }

    #[test]
    fn merge_toml_scalar_override() {
        let base: toml::Value = toml::from_str("a = 1").unwrap();
        let overlay: toml::Value = toml::from_str("a = 2").unwrap();
        assert_eq!(merge_toml(base, overlay).get("a").unwrap().as_integer(), Some(2));
    }

    #[test]
    fn resolve_config_with_overlay() {
        let overlay: toml::Value = toml::from_str("[output]\nformat = \"jpeg\"\n").unwrap();
        let config = resolve_config(stock_defaults_value(), Some(overlay)).unwrap();
        assert_eq!(config.output.format, OutputFormat::Jpeg);
        assert_eq!(config.output.quality, 0.92);
    }

    // =========================================================================
    // stock_config_toml tests
    // =========================================================================

    #[test]
    fn stock_config_toml_roundtrips_to_defaults() {
        let config: AppConfig = toml::from_str(stock_config_toml()).unwrap();
        let defaults = AppConfig::default();
        assert_eq!(config.composite.texture, defaults.composite.texture);
        assert_eq!(config.composite.blend_mode, defaults.composite.blend_mode);
        assert_eq!(config.output.quality, defaults.output.quality);
        assert_eq!(config.output.filename, defaults.output.filename);
        assert_eq!(config.delivery.share_command, defaults.delivery.share_command);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn stock_config_toml_contains_all_sections() {
        let content = stock_config_toml();
        for section in ["[composite]", "[tone]", "[output]", "[assets]", "[delivery]"] {
            assert!(content.contains(section), "missing {section}");
        }
    }

    #[test]
    fn stock_defaults_value_has_all_sections() {
        let val = stock_defaults_value();
        for key in ["composite", "tone", "output", "assets", "delivery"] {
            assert!(val.get(key).is_some(), "missing {key}");
        }
    }
}
