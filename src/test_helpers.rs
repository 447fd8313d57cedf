//! Shared test utilities for the texture-adder test suite.
//!
//! Provides synthetic bitmaps, on-disk texture fixtures, and a delivery sink
//! that records what it was handed instead of touching the filesystem.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = setup_textures();
//! let loader = Loader::new(tmp.path());
//!
//! let photo = solid_bitmap(4, 4, [255, 0, 0, 255]);
//! let sink = RecordingSink::new();
//! ```

use std::path::PathBuf;
use std::sync::Mutex;

use image::{ImageFormat, Rgba, RgbaImage};
use tempfile::TempDir;

use crate::delivery::{DeliveryError, DeliverySink};
use crate::imaging::{Bitmap, EncodedImage};
use crate::loader::TEXTURES;

// =========================================================================
// Bitmaps
// =========================================================================

/// A `width` × `height` bitmap filled with one colour.
pub fn solid_bitmap(width: u32, height: u32, rgba: [u8; 4]) -> Bitmap {
    Bitmap::from_rgba(RgbaImage::from_pixel(width, height, Rgba(rgba))).unwrap()
}

/// A bitmap with enough high-frequency detail that lossy encoders have
/// something to throw away.
pub fn gradient_bitmap(width: u32, height: u32) -> Bitmap {
    let img = RgbaImage::from_fn(width, height, |x, y| {
        Rgba([
            (x * 4 % 256) as u8,
            (y * 4 % 256) as u8,
            ((x * y * 7 + x * 13) % 256) as u8,
            255,
        ])
    });
    Bitmap::from_rgba(img).unwrap()
}

/// PNG-encode a solid image, for tests that need real file bytes.
pub fn png_bytes(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
    let img = RgbaImage::from_pixel(width, height, Rgba(rgba));
    let mut out = std::io::Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png).unwrap();
    out.into_inner()
}

// =========================================================================
// Fixture setup
// =========================================================================

/// Write every bundled texture as a small solid image into a temp directory.
///
/// Each texture gets a distinct grey level so tests can tell them apart:
/// the n-th entry of [`TEXTURES`] is filled with `n * 40`.
pub fn setup_textures() -> TempDir {
    let tmp = TempDir::new().unwrap();
    for (i, name) in TEXTURES.iter().enumerate() {
        let level = (i * 40) as u8;
        let img = RgbaImage::from_pixel(8, 8, Rgba([level, level, level, 255]));
        let format = ImageFormat::from_path(name).unwrap();
        let rgb = image::DynamicImage::ImageRgba8(img).to_rgb8();
        rgb.save_with_format(tmp.path().join(name), format).unwrap();
    }
    tmp
}

// =========================================================================
// Delivery
// =========================================================================

/// Sink that keeps every delivered image in memory.
#[derive(Default)]
pub struct RecordingSink {
    pub delivered: Mutex<Vec<EncodedImage>>,
    pub fail: bool,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            delivered: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn deliveries(&self) -> Vec<EncodedImage> {
        self.delivered.lock().unwrap().clone()
    }
}

impl DeliverySink for RecordingSink {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn deliver(&self, image: &EncodedImage) -> Result<PathBuf, DeliveryError> {
        if self.fail {
            return Err(DeliveryError::ShareFailed {
                program: "recording".into(),
                reason: "refused".into(),
            });
        }
        self.delivered.lock().unwrap().push(image.clone());
        Ok(PathBuf::from(&image.filename))
    }
}
