//! Separable blend modes and source-over compositing with global alpha.
//!
//! Formulas follow the W3C Compositing and Blending spec, which is what a
//! canvas `globalCompositeOperation` of the same name does:
//!
//! ```text
//! Cs' = (1 - αb) · Cs + αb · B(Cb, Cs)
//! co  = αs · Cs' + αb · Cb · (1 - αs)
//! αo  = αs + αb · (1 - αs)
//! C   = co / αo
//! ```
//!
//! where `αs` is the texture pixel's alpha multiplied by the layer opacity.
//! Over an opaque backdrop this reduces to
//! `C = B(Cb, Cs) · opacity + Cb · (1 - opacity)`.

use crate::types::BlendMode;

/// Blend one colour channel. `cb` is the backdrop, `cs` the source; both in `[0, 1]`.
#[inline]
pub fn blend_channel(mode: BlendMode, cb: f32, cs: f32) -> f32 {
    match mode {
        BlendMode::Multiply => multiply(cb, cs),
        BlendMode::Screen => screen(cb, cs),
        // overlay(Cb, Cs) = hard-light(Cs, Cb)
        BlendMode::Overlay => hard_light(cs, cb),
        BlendMode::Darken => cb.min(cs),
        BlendMode::Lighten => cb.max(cs),
        BlendMode::Difference => (cb - cs).abs(),
    }
}

#[inline]
fn multiply(cb: f32, cs: f32) -> f32 {
    cb * cs
}

#[inline]
fn screen(cb: f32, cs: f32) -> f32 {
    cb + cs - cb * cs
}

#[inline]
fn hard_light(cb: f32, cs: f32) -> f32 {
    if cs <= 0.5 {
        multiply(cb, 2.0 * cs)
    } else {
        screen(cb, 2.0 * cs - 1.0)
    }
}

/// Composite one straight-alpha RGBA8 source pixel onto a backdrop pixel.
///
/// With `opacity == 0` (or a fully transparent source) the backdrop is
/// returned untouched, bit for bit.
#[inline]
pub fn composite_pixel(mode: BlendMode, backdrop: [u8; 4], source: [u8; 4], opacity: f32) -> [u8; 4] {
    let alpha_s = unit(source[3]) * opacity;
    if alpha_s <= 0.0 {
        return backdrop;
    }
    let alpha_b = unit(backdrop[3]);
    let alpha_o = alpha_s + alpha_b * (1.0 - alpha_s);
    if alpha_o <= 0.0 {
        return [0, 0, 0, 0];
    }

    let mut out = [0u8; 4];
    for i in 0..3 {
        let cb = unit(backdrop[i]);
        let cs = unit(source[i]);
        let mixed = (1.0 - alpha_b) * cs + alpha_b * blend_channel(mode, cb, cs);
        let co = alpha_s * mixed + alpha_b * cb * (1.0 - alpha_s);
        out[i] = to_u8(co / alpha_o);
    }
    out[3] = to_u8(alpha_o);
    out
}

#[inline]
pub(crate) fn unit(v: u8) -> f32 {
    v as f32 / 255.0
}

#[inline]
pub(crate) fn to_u8(v: f32) -> u8 {
    (v * 255.0).round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: [u8; 4] = [255, 0, 0, 255];
    const BLUE: [u8; 4] = [0, 0, 255, 255];
    const GREY: [u8; 4] = [128, 128, 128, 255];

    #[test]
    fn difference_of_red_and_blue_is_magenta() {
        assert_eq!(
            composite_pixel(BlendMode::Difference, RED, BLUE, 1.0),
            [255, 0, 255, 255]
        );
    }

    #[test]
    fn zero_opacity_returns_backdrop_for_every_mode() {
        let backdrop = [12, 200, 77, 255];
        for mode in BlendMode::ALL {
            assert_eq!(composite_pixel(mode, backdrop, BLUE, 0.0), backdrop);
        }
    }

    #[test]
    fn transparent_source_returns_backdrop() {
        let backdrop = [40, 50, 60, 255];
        assert_eq!(
            composite_pixel(BlendMode::Screen, backdrop, [255, 255, 255, 0], 1.0),
            backdrop
        );
    }

    #[test]
    fn multiply_with_white_is_identity() {
        let backdrop = [90, 140, 230, 255];
        assert_eq!(
            composite_pixel(BlendMode::Multiply, backdrop, [255, 255, 255, 255], 1.0),
            backdrop
        );
    }

    #[test]
    fn screen_with_black_is_identity() {
        let backdrop = [90, 140, 230, 255];
        assert_eq!(
            composite_pixel(BlendMode::Screen, backdrop, [0, 0, 0, 255], 1.0),
            backdrop
        );
    }

    #[test]
    fn darken_and_lighten_pick_per_channel() {
        let a = [10, 200, 100, 255];
        let b = [50, 20, 100, 255];
        assert_eq!(composite_pixel(BlendMode::Darken, a, b, 1.0), [10, 20, 100, 255]);
        assert_eq!(composite_pixel(BlendMode::Lighten, a, b, 1.0), [50, 200, 100, 255]);
    }

    #[test]
    fn overlay_uses_backdrop_to_choose_branch() {
        // dark backdrop → multiply(2·cb, cs); light backdrop → screen
        assert!(blend_channel(BlendMode::Overlay, 0.2, 0.5) < 0.5);
        assert!(blend_channel(BlendMode::Overlay, 0.8, 0.5) > 0.5);
        // mid-grey source leaves the backdrop in place
        assert!((blend_channel(BlendMode::Overlay, 0.3, 0.5) - 0.3).abs() < 1e-6);
    }

    #[test]
    fn half_opacity_mixes_linearly_over_opaque_backdrop() {
        // multiply(grey, black) = 0; half opacity → grey / 2
        let out = composite_pixel(BlendMode::Multiply, GREY, [0, 0, 0, 255], 0.5);
        assert_eq!(out, [64, 64, 64, 255]);
    }

    #[test]
    fn source_over_transparent_backdrop_shows_source() {
        let out = composite_pixel(BlendMode::Difference, [0, 0, 0, 0], [30, 60, 90, 255], 1.0);
        assert_eq!(out, [30, 60, 90, 255]);
    }
}
