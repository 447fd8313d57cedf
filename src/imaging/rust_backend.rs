//! Pure Rust backend built on the `image` crate.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, WebP, TIFF, GIF, BMP) | `image::load_from_memory` (format sniffed from content) |
//! | Scale to target rectangle | `image::imageops::resize` with `Triangle` (bilinear) |
//! | Blend pass | [`blend::composite_pixel`](super::blend::composite_pixel) over `rayon` pixel chunks |
//! | Tone pass | [`tone::apply_tone_in_place`](super::tone::apply_tone_in_place) |
//! | Encode → PNG | `image::codecs::png::PngEncoder` (lossless, deterministic) |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` with quality, alpha flattened over black |
//! | Encode → WebP | quality-driven RGB quantisation + `image::codecs::webp::WebPEncoder` (lossless container) |

use super::backend::{BackendError, Bitmap, EncodedImage, ImageBackend, Surface};
use super::blend::composite_pixel;
use super::calculations::{surface_dimensions, surface_fits};
use super::params::{CompositeParams, EncodeParams, Quality, ToneParameters};
use super::tone::apply_tone_in_place;
use crate::types::OutputFormat;
use image::imageops::FilterType;
use image::{ExtendedColorType, ImageEncoder, RgbImage, RgbaImage};
use rayon::prelude::*;
use tracing::{debug, warn};

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode image bytes into a [`Bitmap`].
///
/// Free function so the async loader can run it on a blocking thread without
/// borrowing a backend.
pub fn decode_bitmap(bytes: &[u8]) -> Result<Bitmap, BackendError> {
    if bytes.is_empty() {
        return Err(BackendError::Decode("input is empty (0 bytes)".into()));
    }
    let img = image::load_from_memory(bytes)
        .map_err(|e| BackendError::Decode(format!("unrecognised or corrupt image: {e}")))?;
    Bitmap::from_rgba(img.to_rgba8())
}

/// Scale an image to exactly `width` × `height`, ignoring aspect ratio, the
/// way `drawImage(img, 0, 0, w, h)` fills a rectangle.
fn fill_rect(src: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    if src.dimensions() == (width, height) {
        src.clone()
    } else {
        image::imageops::resize(src, width, height, FilterType::Triangle)
    }
}

/// Blend `layer` onto `backdrop` in place. Buffers must be the same size.
fn blend_layer(backdrop: &mut RgbaImage, layer: &RgbaImage, params: &CompositeParams) {
    let opacity = params.opacity.value();
    if opacity <= 0.0 {
        return;
    }
    let mode = params.blend_mode;
    let dst: &mut [u8] = backdrop;
    let src: &[u8] = layer;
    dst.par_chunks_exact_mut(4)
        .zip(src.par_chunks_exact(4))
        .for_each(|(d, s)| {
            let out = composite_pixel(mode, [d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]], opacity);
            d.copy_from_slice(&out);
        });
}

fn encode_png(img: &RgbaImage) -> Result<Vec<u8>, BackendError> {
    let mut buffer = Vec::new();
    image::codecs::png::PngEncoder::new(&mut buffer)
        .write_image(img.as_raw(), img.width(), img.height(), ExtendedColorType::Rgba8)
        .map_err(|e| BackendError::Encode(format!("PNG encode failed: {e}")))?;
    Ok(buffer)
}

fn encode_jpeg(img: &RgbaImage, quality: Quality) -> Result<Vec<u8>, BackendError> {
    let rgb = flatten_over_black(img);
    let mut buffer = Vec::new();
    image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, quality.percent())
        .write_image(rgb.as_raw(), rgb.width(), rgb.height(), ExtendedColorType::Rgb8)
        .map_err(|e| BackendError::Encode(format!("JPEG encode failed: {e}")))?;
    Ok(buffer)
}

fn encode_webp(img: &RgbaImage, quality: Quality) -> Result<Vec<u8>, BackendError> {
    let mut rgba = img.clone();
    quantize_rgb(&mut rgba, quality);
    let mut buffer = Vec::new();
    image::codecs::webp::WebPEncoder::new_lossless(&mut buffer)
        .write_image(rgba.as_raw(), rgba.width(), rgba.height(), ExtendedColorType::Rgba8)
        .map_err(|e| BackendError::Encode(format!("WebP encode failed: {e}")))?;
    Ok(buffer)
}

/// JPEG has no alpha channel; premultiply so transparent areas come out black.
fn flatten_over_black(img: &RgbaImage) -> RgbImage {
    RgbImage::from_fn(img.width(), img.height(), |x, y| {
        let [r, g, b, a] = img.get_pixel(x, y).0;
        let mul = |c: u8| ((c as u32 * a as u32 + 127) / 255) as u8;
        image::Rgb([mul(r), mul(g), mul(b)])
    })
}

/// Reduce colour precision according to quality so the lossless WebP
/// container compresses better. Alpha is left untouched.
fn quantize_rgb(img: &mut RgbaImage, quality: Quality) {
    let levels = webp_levels(quality);
    if levels >= 256 {
        return;
    }
    let step = 255.0 / (levels as f32 - 1.0);
    let data: &mut [u8] = img;
    data.par_chunks_exact_mut(4).for_each(|px| {
        for c in px.iter_mut().take(3) {
            let bucket = (*c as f32 / step).round();
            *c = (bucket * step).round().clamp(0.0, 255.0) as u8;
        }
    });
}

/// Palette levels per channel: quadratic in quality, 256 at 1.0.
fn webp_levels(quality: Quality) -> u16 {
    let percent = quality.percent();
    if percent >= 100 {
        return 256;
    }
    let n = percent as f32 / 100.0;
    (2.0 + n * n * 254.0).round().clamp(2.0, 256.0) as u16
}

/// MIME type to attach to an encoded buffer.
///
/// The buffer is sniffed; if the container does not match the requested
/// format the requested MIME type is used anyway and the second value is
/// `true`, so callers can log the relabel.
pub fn label_encoded(bytes: &[u8], requested: OutputFormat) -> (&'static str, bool) {
    let sniffed = image::guess_format(bytes)
        .ok()
        .and_then(OutputFormat::from_image_format);
    (requested.mime_type(), sniffed != Some(requested))
}

impl ImageBackend for RustBackend {
    fn decode(&self, bytes: &[u8]) -> Result<Bitmap, BackendError> {
        decode_bitmap(bytes)
    }

    fn composite(
        &self,
        photo: &Bitmap,
        texture: &Bitmap,
        params: &CompositeParams,
    ) -> Result<Surface, BackendError> {
        let alloc_err = BackendError::SurfaceAllocation {
            width: params.width,
            height: params.height,
        };
        if params.width == 0 || params.height == 0 {
            return Err(alloc_err);
        }
        let (sw, sh) = surface_dimensions(params.width, params.height, params.pixel_ratio)
            .filter(|&(w, h)| surface_fits(w, h))
            .ok_or(alloc_err)?;

        debug!(
            width = sw,
            height = sh,
            blend = %params.blend_mode,
            opacity = params.opacity.value(),
            "compositing"
        );

        // Source-over onto a cleared surface leaves exactly the photo pixels.
        let mut backdrop = fill_rect(photo.as_rgba(), sw, sh);
        let layer = fill_rect(texture.as_rgba(), sw, sh);
        blend_layer(&mut backdrop, &layer, params);

        Ok(Surface::from_rgba(backdrop))
    }

    fn apply_tone(
        &self,
        surface: &Surface,
        tone: &ToneParameters,
    ) -> Result<Surface, BackendError> {
        let mut out = surface.clone();
        apply_tone_in_place(out.as_rgba_mut(), tone);
        Ok(out)
    }

    fn encode(
        &self,
        surface: &Surface,
        params: &EncodeParams,
    ) -> Result<EncodedImage, BackendError> {
        let (w, h) = surface.dimensions();
        if w == 0 || h == 0 {
            return Err(BackendError::Encode(format!(
                "cannot encode a {w}x{h} surface"
            )));
        }

        let quality = params.quality.unwrap_or_default();
        let bytes = match params.format {
            OutputFormat::Png => encode_png(surface.as_rgba())?,
            OutputFormat::Jpeg => encode_jpeg(surface.as_rgba(), quality)?,
            OutputFormat::Webp => encode_webp(surface.as_rgba(), quality)?,
        };
        if bytes.is_empty() {
            return Err(BackendError::Encode("encoder produced no data".into()));
        }

        let (mime_type, relabelled) = label_encoded(&bytes, params.format);
        if relabelled {
            warn!(
                requested = %params.format,
                "encoded buffer did not sniff as the requested format, relabelling"
            );
        }

        Ok(EncodedImage {
            bytes,
            format: params.format,
            mime_type,
            filename: params.filename.clone(),
        })
    }
}
