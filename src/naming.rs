//! Filename and label conventions.
//!
//! Exported files are always named `{base}.{ext}`, where the extension comes
//! from the output format (`.png`, `.jpg`, `.webp`) and never from the base.
//! Texture assets are labelled by their stem, so `vinyl-bleed.jpg` shows up
//! as `vinyl-bleed` in menus and CLI listings.

use crate::types::OutputFormat;

/// Base name used when the caller supplies nothing usable.
pub const DEFAULT_BASE_NAME: &str = "blended-image";

/// Build the suggested filename for an export.
///
/// - `("blended-image", Png)` → `"blended-image.png"`
/// - `("holiday shot.jpeg", Webp)` → `"holiday-shot.webp"`
/// - `("../etc/passwd", Jpeg)` → `"passwd.jpg"`
/// - `("", Png)` → `"blended-image.png"`
pub fn output_filename(base: &str, format: OutputFormat) -> String {
    format!("{}.{}", sanitize_base(base), format.extension())
}

/// Reduce a user-supplied base name to a safe single path component.
///
/// Directory parts and a trailing image extension are dropped, whitespace
/// runs become single dashes, and anything outside `[A-Za-z0-9._-]` is removed.
pub fn sanitize_base(base: &str) -> String {
    let last = base
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();
    let stem = strip_image_extension(last);

    let mut out = String::with_capacity(stem.len());
    let mut pending_dash = false;
    for c in stem.chars() {
        if c.is_whitespace() {
            pending_dash = !out.is_empty();
            continue;
        }
        if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
            if pending_dash {
                out.push('-');
                pending_dash = false;
            }
            out.push(c);
        }
    }

    let trimmed = out.trim_matches('.');
    if trimmed.is_empty() {
        DEFAULT_BASE_NAME.to_string()
    } else {
        trimmed.to_string()
    }
}

fn strip_image_extension(name: &str) -> &str {
    const KNOWN: &[&str] = &["png", "jpg", "jpeg", "webp"];
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && KNOWN.iter().any(|k| ext.eq_ignore_ascii_case(k)) => {
            stem
        }
        _ => name,
    }
}

/// Menu label for a texture file: everything before the first dot.
pub fn texture_label(file_name: &str) -> &str {
    file_name.split('.').next().unwrap_or(file_name)
}
