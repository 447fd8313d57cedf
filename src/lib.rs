//! # Texture Adder
//!
//! Blend a photograph with a texture overlay, adjust its tone, and export
//! the result as PNG, JPEG or WebP.
//!
//! # Architecture: Two-Pass Pipeline
//!
//! Every export, and every preview, runs the same two passes in a fixed
//! order:
//!
//! ```text
//! Loader ─→ photo + texture bitmaps
//!           │
//!           ▼
//! Plan      target size (longer-edge cap, never upscaled) × pixel ratio
//!           │
//!           ▼
//! Pass 1    photo as backdrop, texture blended on top with opacity
//!           │
//!           ▼
//! Pass 2    brightness → contrast → saturation on the blended result
//!           │
//!           ▼
//! Encode    PNG / JPEG / WebP ─→ delivery sink (download or share)
//! ```
//!
//! Reversing the passes changes the output, so the order is fixed in the
//! orchestrator rather than left to callers.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`loader`] | Async decoding of uploads and the bundled textures, with a texture cache |
//! | [`imaging`] | Pure-Rust pixel work: size planning, blend modes, tone, encoding |
//! | [`export`] | Export state machine, progress events, per-export settings |
//! | [`session`] | Current photo and texture selection, preview and export entry points |
//! | [`delivery`] | Where finished exports go: download directory or share command |
//! | [`config`] | `texture-adder.toml` loading, merging over stock defaults, validation |
//! | [`types`] | Closed enums shared across the crate: blend mode, size preset, format |
//! | [`naming`] | Output filenames and texture labels |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## One Tone Transform
//!
//! The preview and the export share [`imaging::tone`]. There is no second
//! formula for the preview to drift from; hosts that preview through CSS get
//! the equivalent filter chain from [`imaging::css_filter`].
//!
//! ## Settings Are Values
//!
//! Slider positions, blend mode and output choices travel as an immutable
//! [`export::ExportSettings`] passed into each call. The pipeline keeps no
//! state between exports; the [`session::Session`] only remembers which
//! photo and texture are selected.
//!
//! ## Delivery Chosen Once
//!
//! Whether exports are shared or saved is decided when the session starts
//! ([`delivery::select_sink`]). The export path only ever sees a
//! [`delivery::DeliverySink`].
//!
//! ## Pure-Rust Imaging
//!
//! Decoding and encoding go through the `image` crate, with `rayon` for the
//! per-pixel passes. No system libraries are needed.

pub mod config;
pub mod delivery;
pub mod export;
pub mod imaging;
pub mod loader;
pub mod naming;
pub mod output;
pub mod session;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
