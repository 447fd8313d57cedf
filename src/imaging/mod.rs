//! Image pipeline core, pure Rust with no system libraries.
//!
//! | Stage | Where |
//! |---|---|
//! | **Decode** | [`rust_backend::decode_bitmap`] via `image::load_from_memory` |
//! | **Plan size** | [`plan_output_size`], [`plan_export`] |
//! | **Pass 1: composite** | [`ImageBackend::composite`] using [`blend`] formulas |
//! | **Pass 2: tone** | [`ImageBackend::apply_tone`] using [`tone`] |
//! | **Encode** | [`ImageBackend::encode`] → PNG / JPEG / WebP |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing each operation
//! - **Blend / Tone**: Per-pixel math, shared by export and preview
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: [`ExportPlan`] construction

pub mod backend;
pub mod blend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;
pub mod tone;

pub use backend::{BackendError, Bitmap, EncodedImage, ImageBackend, Surface};
pub use calculations::{MAX_SURFACE_PIXELS, fit_longer_edge, plan_output_size, surface_dimensions};
pub use operations::{ExportPlan, PlanRequest, plan_export};
pub use params::{CompositeParams, EncodeParams, Opacity, Quality, ToneParameters};
pub use rust_backend::{RustBackend, decode_bitmap};
pub use tone::css_filter;
