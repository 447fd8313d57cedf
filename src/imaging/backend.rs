//! Pixel containers, the error taxonomy, and the backend trait.
//!
//! The [`ImageBackend`] trait defines the four operations every backend must
//! support: decode, composite, apply_tone, and encode. The production
//! implementation is [`RustBackend`](super::rust_backend::RustBackend); tests
//! use a recording mock so the orchestrator can be exercised without pixels.
//!
//! ## Ownership
//!
//! A [`Bitmap`] is a decoded source image and is never mutated once built.
//! A [`Surface`] is a working buffer produced by one stage and handed to the
//! next; every stage returns a fresh surface rather than editing its input.

use super::params::{CompositeParams, EncodeParams, ToneParameters};
use crate::types::OutputFormat;
use image::RgbaImage;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Decode failed: {0}")]
    Decode(String),
    #[error("Cannot allocate {width}x{height} surface")]
    SurfaceAllocation { width: u32, height: u32 },
    #[error("Encode failed: {0}")]
    Encode(String),
}

/// A decoded raster image, RGBA8 with straight alpha.
///
/// Both dimensions are always non-zero.
#[derive(Debug, Clone, PartialEq)]
pub struct Bitmap {
    pixels: RgbaImage,
}

impl Bitmap {
    /// Wrap an RGBA buffer. Fails on a zero-sized image.
    pub fn from_rgba(pixels: RgbaImage) -> Result<Self, BackendError> {
        if pixels.width() == 0 || pixels.height() == 0 {
            return Err(BackendError::Decode(format!(
                "image has zero size ({}x{})",
                pixels.width(),
                pixels.height()
            )));
        }
        Ok(Self { pixels })
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        self.pixels.get_pixel(x, y).0
    }

    pub fn as_rgba(&self) -> &RgbaImage {
        &self.pixels
    }
}

/// A working pixel surface produced by one pipeline stage.
#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    pixels: RgbaImage,
}

impl Surface {
    pub(crate) fn from_rgba(pixels: RgbaImage) -> Self {
        Self { pixels }
    }

    /// Start a surface from a bitmap's pixels.
    pub fn from_bitmap(bitmap: &Bitmap) -> Self {
        Self {
            pixels: bitmap.pixels.clone(),
        }
    }

    /// Freeze this surface into an immutable bitmap.
    pub fn into_bitmap(self) -> Result<Bitmap, BackendError> {
        Bitmap::from_rgba(self.pixels)
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        self.pixels.get_pixel(x, y).0
    }

    pub fn as_rgba(&self) -> &RgbaImage {
        &self.pixels
    }

    pub(crate) fn as_rgba_mut(&mut self) -> &mut RgbaImage {
        &mut self.pixels
    }

    pub fn into_rgba(self) -> RgbaImage {
        self.pixels
    }
}

/// The successful result of one export: bytes plus how to label them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub bytes: Vec<u8>,
    pub format: OutputFormat,
    pub mime_type: &'static str,
    pub filename: String,
}

/// Trait for image backends.
///
/// Every backend implements all four operations so the orchestrator is
/// backend-agnostic.
pub trait ImageBackend: Sync {
    /// Decode arbitrary image bytes. Zero-byte or corrupt input is a
    /// [`BackendError::Decode`], never an empty bitmap.
    fn decode(&self, bytes: &[u8]) -> Result<Bitmap, BackendError>;

    /// Pass 1: photo as backdrop, texture blended on top.
    fn composite(
        &self,
        photo: &Bitmap,
        texture: &Bitmap,
        params: &CompositeParams,
    ) -> Result<Surface, BackendError>;

    /// Pass 2: brightness → contrast → saturation on the composited surface.
    fn apply_tone(&self, surface: &Surface, tone: &ToneParameters)
    -> Result<Surface, BackendError>;

    /// Serialize a surface; the returned MIME type always matches `params.format`.
    fn encode(&self, surface: &Surface, params: &EncodeParams)
    -> Result<EncodedImage, BackendError>;
}
