//! High-level planning for one export.
//!
//! These functions combine the pure calculations with the caller's settings
//! into an [`ExportPlan`], which the orchestrator then feeds to the backend.

use super::backend::BackendError;
use super::calculations::{plan_output_size, surface_dimensions, surface_fits};
use super::params::{CompositeParams, EncodeParams, Opacity, Quality};
use crate::naming::output_filename;
use crate::types::{BlendMode, OutputFormat, SizePreset};
use serde::Serialize;

/// Resolved configuration for a single export. Built fresh per call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportPlan {
    pub source_width: u32,
    pub source_height: u32,
    pub size: SizePreset,
    /// Target size in logical pixels.
    pub width: u32,
    pub height: u32,
    pub pixel_ratio: f32,
    /// Actual encoded size: target × pixel ratio.
    pub surface_width: u32,
    pub surface_height: u32,
    pub format: OutputFormat,
    /// Always `None` for PNG.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<Quality>,
    pub filename: String,
    pub mime_type: &'static str,
}

/// What the caller asks for; [`plan_export`] resolves it against a source size.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanRequest<'a> {
    pub size: SizePreset,
    pub pixel_ratio: f32,
    pub format: OutputFormat,
    pub quality: Option<Quality>,
    pub base_name: &'a str,
}

/// Plan an export without executing it.
///
/// Fails with [`BackendError::SurfaceAllocation`] when the working surface
/// would be empty, overflow, or exceed the allocation cap.
pub fn plan_export(
    source: (u32, u32),
    request: &PlanRequest<'_>,
) -> Result<ExportPlan, BackendError> {
    let (source_width, source_height) = source;
    if source_width == 0 || source_height == 0 {
        return Err(BackendError::SurfaceAllocation {
            width: source_width,
            height: source_height,
        });
    }

    let (width, height) = plan_output_size(source_width, source_height, request.size);
    let (surface_width, surface_height) =
        surface_dimensions(width, height, request.pixel_ratio)
            .filter(|&(w, h)| surface_fits(w, h))
            .ok_or(BackendError::SurfaceAllocation { width, height })?;

    let quality = if request.format.is_lossy() {
        Some(request.quality.unwrap_or_default())
    } else {
        None
    };

    Ok(ExportPlan {
        source_width,
        source_height,
        size: request.size,
        width,
        height,
        pixel_ratio: request.pixel_ratio,
        surface_width,
        surface_height,
        format: request.format,
        quality,
        filename: output_filename(request.base_name, request.format),
        mime_type: request.format.mime_type(),
    })
}

impl ExportPlan {
    pub fn composite_params(&self, blend_mode: BlendMode, opacity: Opacity) -> CompositeParams {
        CompositeParams {
            width: self.width,
            height: self.height,
            pixel_ratio: self.pixel_ratio,
            blend_mode,
            opacity,
        }
    }

    pub fn encode_params(&self) -> EncodeParams {
        EncodeParams::new(self.format, self.quality, self.filename.clone())
    }
}
