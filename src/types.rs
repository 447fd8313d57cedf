//! Closed value sets shared across the pipeline stages.
//!
//! These enums are the only way a blend mode, size preset, or output format
//! enters the pipeline. Config files, CLI flags, and library callers all go
//! through the same `serde` / `FromStr` spellings, so an arbitrary string can
//! never reach the compositor or the encoder.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Error returned when parsing one of the closed enums from a string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}' (expected one of: {expected})")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
    pub expected: &'static str,
}

/// Compositing operator used to draw the texture over the photo.
///
/// Names follow the canvas `globalCompositeOperation` / CSS `mix-blend-mode`
/// keywords.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum BlendMode {
    #[default]
    Overlay,
    Multiply,
    Screen,
    Darken,
    Lighten,
    Difference,
}

impl BlendMode {
    pub const ALL: [BlendMode; 6] = [
        BlendMode::Overlay,
        BlendMode::Multiply,
        BlendMode::Screen,
        BlendMode::Darken,
        BlendMode::Lighten,
        BlendMode::Difference,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            BlendMode::Overlay => "overlay",
            BlendMode::Multiply => "multiply",
            BlendMode::Screen => "screen",
            BlendMode::Darken => "darken",
            BlendMode::Lighten => "lighten",
            BlendMode::Difference => "difference",
        }
    }
}

impl fmt::Display for BlendMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BlendMode {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BlendMode::ALL
            .into_iter()
            .find(|mode| mode.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseEnumError {
                kind: "blend mode",
                value: s.to_string(),
                expected: "overlay, multiply, screen, darken, lighten, difference",
            })
    }
}

/// Requested output size, expressed as a cap on the longer edge.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
pub enum SizePreset {
    #[default]
    #[serde(rename = "original")]
    #[value(name = "original")]
    Original,
    #[serde(rename = "4k")]
    #[value(name = "4k")]
    Uhd4k,
    #[serde(rename = "2k")]
    #[value(name = "2k")]
    Qhd2k,
    #[serde(rename = "1080p")]
    #[value(name = "1080p")]
    FullHd,
}

impl SizePreset {
    pub const ALL: [SizePreset; 4] = [
        SizePreset::Original,
        SizePreset::Uhd4k,
        SizePreset::Qhd2k,
        SizePreset::FullHd,
    ];

    /// Longer-edge cap in pixels, `None` for the original size.
    pub fn longer_edge_cap(self) -> Option<u32> {
        match self {
            SizePreset::Original => None,
            SizePreset::Uhd4k => Some(3840),
            SizePreset::Qhd2k => Some(2560),
            SizePreset::FullHd => Some(1920),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SizePreset::Original => "original",
            SizePreset::Uhd4k => "4k",
            SizePreset::Qhd2k => "2k",
            SizePreset::FullHd => "1080p",
        }
    }
}

impl fmt::Display for SizePreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SizePreset {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SizePreset::ALL
            .into_iter()
            .find(|preset| preset.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseEnumError {
                kind: "size preset",
                value: s.to_string(),
                expected: "original, 4k, 2k, 1080p",
            })
    }
}

/// Encoded output format.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Png,
    Jpeg,
    Webp,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 3] = [OutputFormat::Png, OutputFormat::Jpeg, OutputFormat::Webp];

    pub fn as_str(self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Jpeg => "jpeg",
            OutputFormat::Webp => "webp",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            OutputFormat::Png => "image/png",
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::Webp => "image/webp",
        }
    }

    /// File extension used for exported files (`.jpg`, not `.jpeg`).
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Jpeg => "jpg",
            OutputFormat::Webp => "webp",
        }
    }

    /// Whether the encoder honours a quality setting.
    pub fn is_lossy(self) -> bool {
        !matches!(self, OutputFormat::Png)
    }

    /// Map a sniffed container format back onto an output format.
    pub fn from_image_format(format: image::ImageFormat) -> Option<Self> {
        match format {
            image::ImageFormat::Png => Some(OutputFormat::Png),
            image::ImageFormat::Jpeg => Some(OutputFormat::Jpeg),
            image::ImageFormat::WebP => Some(OutputFormat::Webp),
            _ => None,
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(OutputFormat::Png),
            "jpeg" | "jpg" => Ok(OutputFormat::Jpeg),
            "webp" => Ok(OutputFormat::Webp),
            _ => Err(ParseEnumError {
                kind: "output format",
                value: s.to_string(),
                expected: "png, jpeg, webp",
            }),
        }
    }
}
