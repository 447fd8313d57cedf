//! End-to-end checks of the blend → tone → encode pipeline through the
//! public API, using the real backend.

use image::{Rgba, RgbaImage};
use texture_adder::export::{ExportSettings, run_pipeline};
use texture_adder::imaging::{
    BackendError, Bitmap, CompositeParams, EncodeParams, ImageBackend, Opacity, Quality,
    RustBackend, Surface, ToneParameters, decode_bitmap, plan_output_size,
};
use texture_adder::loader::{ImageSource, Loader, LoaderError};
use texture_adder::types::{BlendMode, OutputFormat, SizePreset};

fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Bitmap {
    Bitmap::from_rgba(RgbaImage::from_pixel(width, height, Rgba(rgba))).unwrap()
}

fn noisy(width: u32, height: u32) -> Bitmap {
    Bitmap::from_rgba(RgbaImage::from_fn(width, height, |x, y| {
        let v = x.wrapping_mul(2_654_435_761) ^ y.wrapping_mul(40_503);
        Rgba([(v >> 3) as u8, (v >> 11) as u8, (v >> 19) as u8, 255])
    }))
    .unwrap()
}

fn composite_params(bitmap: &Bitmap, blend_mode: BlendMode, opacity: f32) -> CompositeParams {
    CompositeParams {
        width: bitmap.width(),
        height: bitmap.height(),
        pixel_ratio: 1.0,
        blend_mode,
        opacity: Opacity::new(opacity),
    }
}

#[test]
fn red_difference_blue_is_magenta() {
    let backend = RustBackend::new();
    let red = solid(4, 4, [255, 0, 0, 255]);
    let blue = solid(4, 4, [0, 0, 255, 255]);

    let surface = backend
        .composite(&red, &blue, &composite_params(&red, BlendMode::Difference, 1.0))
        .unwrap();
    let toned = backend.apply_tone(&surface, &ToneParameters::IDENTITY).unwrap();

    assert_eq!(toned.dimensions(), (4, 4));
    assert!(toned.as_rgba().pixels().all(|p| p.0 == [255, 0, 255, 255]));
}

#[test]
fn pass_order_changes_the_result() {
    let backend = RustBackend::new();
    let photo = solid(2, 2, [200, 200, 200, 255]);
    let texture = solid(2, 2, [200, 200, 200, 255]);
    let params = composite_params(&photo, BlendMode::Multiply, 1.0);
    let brighter = ToneParameters::new(1.5, 1.0, 1.0);

    let blended = backend.composite(&photo, &texture, &params).unwrap();
    let composite_first = backend.apply_tone(&blended, &brighter).unwrap();

    let bright_photo = backend
        .apply_tone(&Surface::from_bitmap(&photo), &brighter)
        .unwrap()
        .into_bitmap()
        .unwrap();
    let tone_first = backend.composite(&bright_photo, &texture, &params).unwrap();

    // 200·200/255 ≈ 157, ×1.5 ≈ 235; the other way the photo saturates at 255
    // and multiplying by 200/255 gives back 200.
    let a = composite_first.pixel(0, 0)[0];
    let b = tone_first.pixel(0, 0)[0];
    assert!((234..=236).contains(&a), "composite first gave {a}");
    assert_eq!(b, 200);
}

#[test]
fn identity_tone_is_pixel_identical() {
    let backend = RustBackend::new();
    let surface = Surface::from_bitmap(&noisy(33, 17));
    let out = backend.apply_tone(&surface, &ToneParameters::IDENTITY).unwrap();
    assert_eq!(out.as_rgba(), surface.as_rgba());
}

#[test]
fn opacity_bounds() {
    let backend = RustBackend::new();
    let photo = noisy(12, 9);
    let texture = solid(12, 9, [40, 220, 90, 255]);

    for mode in BlendMode::ALL {
        let none = backend
            .composite(&photo, &texture, &composite_params(&photo, mode, 0.0))
            .unwrap();
        assert_eq!(none.as_rgba(), photo.as_rgba(), "{mode} at opacity 0");
    }

    // Full opacity lighten is exactly max(photo, texture) per channel.
    let full = backend
        .composite(&photo, &texture, &composite_params(&photo, BlendMode::Lighten, 1.0))
        .unwrap();
    for (x, y, p) in photo.as_rgba().enumerate_pixels() {
        let expected = [p.0[0].max(40), p.0[1].max(220), p.0[2].max(90), 255];
        assert_eq!(full.pixel(x, y), expected);
    }
}

/// Separable blend functions from the W3C compositing formulas, with the
/// photo as backdrop `cb` and the texture as source `cs`.
fn reference_blend(mode: BlendMode, cb: f32, cs: f32) -> f32 {
    match mode {
        BlendMode::Multiply => cb * cs,
        BlendMode::Screen => cb + cs - cb * cs,
        BlendMode::Overlay => {
            if cb <= 0.5 {
                2.0 * cb * cs
            } else {
                1.0 - 2.0 * (1.0 - cb) * (1.0 - cs)
            }
        }
        BlendMode::Darken => cb.min(cs),
        BlendMode::Lighten => cb.max(cs),
        BlendMode::Difference => (cb - cs).abs(),
    }
}

#[test]
fn every_mode_matches_reference_formula() {
    let backend = RustBackend::new();
    let pairs = [
        ([200, 60, 130], [90, 220, 30]),
        ([30, 140, 250], [180, 10, 100]),
        ([128, 127, 64], [64, 191, 255]),
    ];

    for mode in BlendMode::ALL {
        for (backdrop, source) in pairs {
            for opacity in [1.0_f32, 0.5] {
                let photo = solid(3, 2, [backdrop[0], backdrop[1], backdrop[2], 255]);
                let texture = solid(3, 2, [source[0], source[1], source[2], 255]);
                let out = backend
                    .composite(&photo, &texture, &composite_params(&photo, mode, opacity))
                    .unwrap();
                let got = out.pixel(1, 1);

                for c in 0..3 {
                    let cb = backdrop[c] as f32 / 255.0;
                    let cs = source[c] as f32 / 255.0;
                    let mixed = reference_blend(mode, cb, cs) * opacity + cb * (1.0 - opacity);
                    let expected = (mixed * 255.0).round() as i32;
                    assert!(
                        (got[c] as i32 - expected).abs() <= 1,
                        "{mode} at {opacity}: {backdrop:?} under {source:?} channel {c} gave {}, expected {expected}",
                        got[c]
                    );
                }
                assert_eq!(got[3], 255, "{mode} at {opacity} alpha");
            }
        }
    }
}

#[test]
fn planner_caps_without_upscaling() {
    assert_eq!(plan_output_size(5000, 2000, SizePreset::FullHd), (1920, 768));
    assert_eq!(plan_output_size(1000, 700, SizePreset::Uhd4k), (1000, 700));
}

#[test]
fn png_reproducible_and_jpeg_quality_matters() {
    let backend = RustBackend::new();
    let surface = Surface::from_bitmap(&noisy(96, 96));

    let png_low = backend
        .encode(&surface, &EncodeParams::new(OutputFormat::Png, Some(Quality::new(0.5)), "a.png"))
        .unwrap();
    let png_again = backend
        .encode(&surface, &EncodeParams::new(OutputFormat::Png, Some(Quality::new(1.0)), "a.png"))
        .unwrap();
    assert_eq!(png_low.bytes, png_again.bytes);

    let jpeg_low = backend
        .encode(&surface, &EncodeParams::new(OutputFormat::Jpeg, Some(Quality::new(0.5)), "a.jpg"))
        .unwrap();
    let jpeg_high = backend
        .encode(&surface, &EncodeParams::new(OutputFormat::Jpeg, Some(Quality::new(1.0)), "a.jpg"))
        .unwrap();
    assert!(jpeg_low.bytes.len() < jpeg_high.bytes.len());
    assert_eq!(jpeg_low.mime_type, "image/jpeg");
}

#[test]
fn encoded_type_matches_requested_format() {
    let backend = RustBackend::new();
    let surface = Surface::from_bitmap(&noisy(10, 10));
    for format in OutputFormat::ALL {
        let out = backend
            .encode(&surface, &EncodeParams::new(format, None, "x"))
            .unwrap();
        assert_eq!(out.mime_type, format.mime_type());
        let sniffed = image::guess_format(&out.bytes).unwrap();
        assert_eq!(OutputFormat::from_image_format(sniffed), Some(format));
    }
}

#[test]
fn full_pipeline_round_trips_through_png() {
    let backend = RustBackend::new();
    let photo = solid(4, 4, [255, 0, 0, 255]);
    let texture = solid(2, 2, [0, 0, 255, 255]);
    let settings = ExportSettings {
        blend_mode: BlendMode::Difference,
        ..ExportSettings::default()
    };

    let encoded = run_pipeline(&backend, &photo, &texture, &settings, None).unwrap();
    assert_eq!(encoded.filename, "blended-image.png");
    let decoded = decode_bitmap(&encoded.bytes).unwrap();
    assert_eq!(decoded.dimensions(), (4, 4));
    assert_eq!(decoded.pixel(3, 3), [255, 0, 255, 255]);
}

#[test]
fn zero_byte_input_is_decode_error() {
    assert!(matches!(decode_bitmap(&[]), Err(BackendError::Decode(_))));
}

#[tokio::test]
async fn loader_rejects_zero_bytes() {
    let loader = Loader::new("textures");
    let err = loader
        .load_bitmap(ImageSource::Bytes(Vec::new()))
        .await
        .unwrap_err();
    assert!(matches!(err, LoaderError::Decode(BackendError::Decode(_))));
}
