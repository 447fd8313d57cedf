//! Tone adjustment: brightness → contrast → saturation.
//!
//! This is the only implementation of the tone transform. The export path,
//! the pixel preview, and the CSS filter string all derive from the same
//! [`ToneParameters`], and the per-pixel math mirrors the Filter Effects
//! definitions of `brightness()`, `contrast()` and `saturate()` so that a
//! host previewing with [`css_filter`] sees the same stage order and
//! coefficients.
//!
//! Each stage works on straight (non-premultiplied) colour in `[0, 1]` and
//! clamps its result before the next stage. Alpha is untouched.

use super::blend::{to_u8, unit};
use super::params::ToneParameters;

// Rec. 709 luma weights as used by the `saturate()` colour matrix.
const LUMA_R: f32 = 0.213;
const LUMA_G: f32 = 0.715;
const LUMA_B: f32 = 0.072;

/// Adjust a single RGBA8 pixel.
#[inline]
pub fn tone_pixel(px: [u8; 4], tone: &ToneParameters) -> [u8; 4] {
    let mut rgb = [unit(px[0]), unit(px[1]), unit(px[2])];

    let b = tone.brightness();
    for c in &mut rgb {
        *c = (*c * b).clamp(0.0, 1.0);
    }

    let k = tone.contrast();
    for c in &mut rgb {
        *c = ((*c - 0.5) * k + 0.5).clamp(0.0, 1.0);
    }

    let rgb = saturate(rgb, tone.saturation());

    [to_u8(rgb[0]), to_u8(rgb[1]), to_u8(rgb[2]), px[3]]
}

/// `saturate(s)` colour matrix: `s < 1` pulls toward luma, `s > 1` pushes away.
fn saturate([r, g, b]: [f32; 3], s: f32) -> [f32; 3] {
    let rr = LUMA_R + (1.0 - LUMA_R) * s;
    let rg = LUMA_G - LUMA_G * s;
    let rb = LUMA_B - LUMA_B * s;

    let gr = LUMA_R - LUMA_R * s;
    let gg = LUMA_G + (1.0 - LUMA_G) * s;
    let gb = LUMA_B - LUMA_B * s;

    let br = LUMA_R - LUMA_R * s;
    let bg = LUMA_G - LUMA_G * s;
    let bb = LUMA_B + (1.0 - LUMA_B) * s;

    [
        (rr * r + rg * g + rb * b).clamp(0.0, 1.0),
        (gr * r + gg * g + gb * b).clamp(0.0, 1.0),
        (br * r + bg * g + bb * b).clamp(0.0, 1.0),
    ]
}

/// Adjust an interleaved RGBA8 buffer in place.
///
/// Identity parameters leave the buffer untouched.
pub fn apply_tone_in_place(rgba: &mut [u8], tone: &ToneParameters) {
    use rayon::prelude::*;

    if tone.is_identity() {
        return;
    }
    rgba.par_chunks_exact_mut(4).for_each(|px| {
        let out = tone_pixel([px[0], px[1], px[2], px[3]], tone);
        px.copy_from_slice(&out);
    });
}

/// CSS filter chain equivalent to [`tone_pixel`], in the same order.
///
/// ```
/// # use texture_adder::imaging::{ToneParameters, css_filter};
/// let tone = ToneParameters::from_percent(150.0, 100.0, 0.0);
/// assert_eq!(css_filter(&tone), "brightness(1.5) contrast(1) saturate(0)");
/// ```
pub fn css_filter(tone: &ToneParameters) -> String {
    format!(
        "brightness({}) contrast({}) saturate({})",
        tone.brightness(),
        tone.contrast(),
        tone.saturation()
    )
}

impl ToneParameters {
    /// Method form of [`css_filter`].
    pub fn css_filter(&self) -> String {
        css_filter(self)
    }
}
