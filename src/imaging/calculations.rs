//! Pure calculation functions for output dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

use crate::types::SizePreset;

/// Compute the export size for a source image and a size preset.
///
/// The preset caps the longer edge; aspect ratio is preserved and the image
/// is never upscaled. Both dimensions are rounded and floored at 1.
///
/// Source dimensions must be non-zero. Decoded bitmaps always satisfy this;
/// a zero dimension is a caller bug, not a recoverable condition.
///
/// # Examples
/// ```
/// # use texture_adder::imaging::plan_output_size;
/// # use texture_adder::types::SizePreset;
/// assert_eq!(plan_output_size(5000, 2000, SizePreset::FullHd), (1920, 768));
/// assert_eq!(plan_output_size(800, 600, SizePreset::FullHd), (800, 600));
/// assert_eq!(plan_output_size(5000, 2000, SizePreset::Original), (5000, 2000));
/// ```
pub fn plan_output_size(source_w: u32, source_h: u32, preset: SizePreset) -> (u32, u32) {
    fit_longer_edge(source_w, source_h, preset.longer_edge_cap())
}

/// Scale `(source_w, source_h)` down so the longer edge is at most `cap`.
///
/// `None` means no cap. Used directly by the preview, which caps at an
/// arbitrary edge length rather than a preset.
pub fn fit_longer_edge(source_w: u32, source_h: u32, cap: Option<u32>) -> (u32, u32) {
    debug_assert!(source_w > 0 && source_h > 0, "source dimensions must be positive");

    let scale = match cap {
        Some(cap) => {
            let longer = source_w.max(source_h).max(1) as f64;
            (cap as f64 / longer).min(1.0)
        }
        None => 1.0,
    };

    (scale_edge(source_w, scale), scale_edge(source_h, scale))
}

fn scale_edge(edge: u32, scale: f64) -> u32 {
    ((edge as f64 * scale).round() as u32).max(1)
}

/// Working-surface size for a logical target size and pixel ratio.
///
/// Each edge is `round(edge * ratio)`, floored at 1. Returns `None` when the
/// ratio is not a finite positive number or the result does not fit in `u32`.
pub fn surface_dimensions(width: u32, height: u32, pixel_ratio: f32) -> Option<(u32, u32)> {
    if !pixel_ratio.is_finite() || pixel_ratio <= 0.0 {
        return None;
    }
    let scale = |edge: u32| -> Option<u32> {
        let scaled = (edge as f64 * pixel_ratio as f64).round();
        if scaled > u32::MAX as f64 {
            None
        } else {
            Some((scaled as u32).max(1))
        }
    };
    Some((scale(width)?, scale(height)?))
}

/// Largest working surface we agree to allocate, in pixels (1 GiB of RGBA8).
pub const MAX_SURFACE_PIXELS: u64 = 1 << 28;

/// Check that a surface of the given size can be allocated.
pub fn surface_fits(width: u32, height: u32) -> bool {
    width > 0 && height > 0 && (width as u64) * (height as u64) <= MAX_SURFACE_PIXELS
}
