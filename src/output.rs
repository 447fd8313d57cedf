//! CLI output formatting.
//!
//! Every `format_*` function is pure and returns display lines, so the
//! layout is unit-testable; the `print_*` wrappers just write them to stdout.
//!
//! # Output Format
//!
//! ## Export
//!
//! ```text
//! [ 10%] Loading texture
//! [ 35%] Blending texture
//! [ 60%] Applying filters
//! [ 80%] Encoding
//! [ 95%] Saving
//! [100%] Done
//! blended-image.png → ./blended-image.png
//!     Size: 1920x768 (1080p, from 5000x2000)
//!     Type: image/png, 1234567 bytes
//! ```
//!
//! ## Plan
//!
//! ```text
//! blended-image.jpg
//!     Source: 5000x2000
//!     Target: 1920x768 (1080p)
//!     Surface: 3840x1536 @2x
//!     Format: image/jpeg, quality 0.92
//! ```
//!
//! ## Textures
//!
//! ```text
//! 001 magazine (magazine.jpg) *
//! 002 vinyl-bleed (vinyl-bleed.jpg)
//! 003 tonor (tonor.png) [missing]
//! ```

use crate::export::{ExportEvent, ExportOutcome, ExportSettings};
use crate::imaging::ExportPlan;
use crate::naming::texture_label;
use std::path::Path;

// ============================================================================
// Export
// ============================================================================

/// Format one progress event.
pub fn format_event(event: &ExportEvent) -> Vec<String> {
    match event {
        ExportEvent::Progress {
            fraction, label, ..
        } => vec![format!("[{:>3}%] {}", (fraction * 100.0).round() as u32, label)],
        ExportEvent::Failed { stage, reason } => {
            vec![format!("FAILED during {}", stage), format!("    {}", reason)]
        }
    }
}

/// Format the settings an export or preview will run with.
pub fn format_settings(texture: &str, settings: &ExportSettings) -> Vec<String> {
    vec![
        format!(
            "Texture: {} ({}, {}%)",
            texture_label(texture),
            settings.blend_mode,
            settings.opacity_percent
        ),
        format!("Filter: {}", settings.tone().css_filter()),
    ]
}

fn plan_detail_lines(plan: &ExportPlan) -> Vec<String> {
    let mut lines = vec![format!(
        "    Size: {}x{} ({}, from {}x{})",
        plan.width, plan.height, plan.size, plan.source_width, plan.source_height
    )];
    if (plan.surface_width, plan.surface_height) != (plan.width, plan.height) {
        lines.push(format!(
            "    Surface: {}x{} @{}x",
            plan.surface_width, plan.surface_height, plan.pixel_ratio
        ));
    }
    lines
}

/// Format the result of a finished export.
pub fn format_export_summary(outcome: &ExportOutcome) -> Vec<String> {
    let mut lines = vec![format!(
        "{} \u{2192} {}",
        outcome.plan.filename,
        outcome.path.display()
    )];
    lines.extend(plan_detail_lines(&outcome.plan));
    lines.push(format!(
        "    Type: {}, {} bytes",
        outcome.mime_type, outcome.bytes
    ));
    lines
}

pub fn print_event(event: &ExportEvent) {
    for line in format_event(event) {
        println!("{}", line);
    }
}

pub fn print_settings(texture: &str, settings: &ExportSettings) {
    for line in format_settings(texture, settings) {
        println!("{}", line);
    }
}

pub fn print_export_summary(outcome: &ExportOutcome) {
    for line in format_export_summary(outcome) {
        println!("{}", line);
    }
}

// ============================================================================
// Plan
// ============================================================================

pub fn format_plan(plan: &ExportPlan) -> Vec<String> {
    let mut lines = vec![
        plan.filename.clone(),
        format!("    Source: {}x{}", plan.source_width, plan.source_height),
        format!("    Target: {}x{} ({})", plan.width, plan.height, plan.size),
        format!(
            "    Surface: {}x{} @{}x",
            plan.surface_width, plan.surface_height, plan.pixel_ratio
        ),
    ];
    lines.push(match plan.quality {
        Some(q) => format!("    Format: {}, quality {}", plan.mime_type, q.value()),
        None => format!("    Format: {}", plan.mime_type),
    });
    lines
}

pub fn print_plan(plan: &ExportPlan) {
    for line in format_plan(plan) {
        println!("{}", line);
    }
}

// ============================================================================
// Textures
// ============================================================================

/// List the bundled textures, marking the selected one and any whose file
/// is not present in `textures_dir`.
pub fn format_texture_list(textures: &[&str], selected: &str, textures_dir: &Path) -> Vec<String> {
    textures
        .iter()
        .enumerate()
        .map(|(i, file)| {
            let mut line = format!("{:03} {} ({})", i + 1, texture_label(file), file);
            if *file == selected {
                line.push_str(" *");
            }
            if !textures_dir.join(file).is_file() {
                line.push_str(" [missing]");
            }
            line
        })
        .collect()
}

pub fn print_texture_list(textures: &[&str], selected: &str, textures_dir: &Path) {
    for line in format_texture_list(textures, selected, textures_dir) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================
