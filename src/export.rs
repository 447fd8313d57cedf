//! Export orchestration.
//!
//! One export walks a fixed sequence of stages:
//!
//! ```text
//! Idle → Decoding → Compositing → ApplyingFilters → Encoding → Delivering → Done
//!                       any stage ──────────────────────────────→ Failed
//! ```
//!
//! Compositing always runs before the tone pass; swapping them changes the
//! output. A failure at any stage ends the export there: the observer gets a
//! single [`ExportEvent::Failed`], and nothing reaches the delivery sink.
//!
//! Progress events go over a plain `std::sync::mpsc` channel. Sends are
//! fire-and-forget, so a slow or vanished observer never affects the result.

use crate::config::AppConfig;
use crate::delivery::{DeliveryError, DeliverySink};
use crate::imaging::{
    BackendError, Bitmap, CompositeParams, EncodedImage, ExportPlan, ImageBackend, Opacity,
    PlanRequest, Quality, Surface, ToneParameters, fit_longer_edge, plan_export,
};
use crate::loader::{ImageSource, Loader, LoaderError};
use crate::types::{BlendMode, OutputFormat, SizePreset};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::sync::mpsc::Sender;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportStage {
    Idle,
    Decoding,
    Compositing,
    ApplyingFilters,
    Encoding,
    Delivering,
    Done,
    Failed,
}

impl ExportStage {
    /// Advisory completion fraction reported when the stage starts.
    pub fn progress(self) -> f32 {
        match self {
            ExportStage::Idle | ExportStage::Failed => 0.0,
            ExportStage::Decoding => 0.1,
            ExportStage::Compositing => 0.35,
            ExportStage::ApplyingFilters => 0.6,
            ExportStage::Encoding => 0.8,
            ExportStage::Delivering => 0.95,
            ExportStage::Done => 1.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ExportStage::Idle => "Idle",
            ExportStage::Decoding => "Loading texture",
            ExportStage::Compositing => "Blending texture",
            ExportStage::ApplyingFilters => "Applying filters",
            ExportStage::Encoding => "Encoding",
            ExportStage::Delivering => "Saving",
            ExportStage::Done => "Done",
            ExportStage::Failed => "Failed",
        }
    }
}

impl fmt::Display for ExportStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// What the observer sees.
#[derive(Debug, Clone, PartialEq)]
pub enum ExportEvent {
    Progress {
        stage: ExportStage,
        fraction: f32,
        label: &'static str,
    },
    /// Terminal; sent once, in place of any further progress.
    Failed { stage: ExportStage, reason: String },
}

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("No photo loaded")]
    NoPhoto,
    #[error("{stage}: {source}")]
    Load {
        stage: ExportStage,
        #[source]
        source: LoaderError,
    },
    #[error("{stage}: {source}")]
    Imaging {
        stage: ExportStage,
        #[source]
        source: BackendError,
    },
    #[error("Saving: {0}")]
    Delivery(#[from] DeliveryError),
}

impl ExportError {
    /// The stage the export was in when it failed.
    pub fn stage(&self) -> ExportStage {
        match self {
            ExportError::NoPhoto => ExportStage::Idle,
            ExportError::Load { stage, .. } | ExportError::Imaging { stage, .. } => *stage,
            ExportError::Delivery(_) => ExportStage::Delivering,
        }
    }
}

fn imaging(stage: ExportStage) -> impl FnOnce(BackendError) -> ExportError {
    move |source| ExportError::Imaging { stage, source }
}

/// Either the encoded image or why it could not be produced.
pub type PipelineResult = Result<EncodedImage, ExportError>;

/// Immutable per-export settings, threaded into each call.
///
/// Slider values stay in percent, as the user set them; the conversion to
/// multipliers happens in one place ([`ExportSettings::tone`]).
#[derive(Debug, Clone, PartialEq)]
pub struct ExportSettings {
    pub blend_mode: BlendMode,
    pub opacity_percent: f32,
    pub brightness_percent: f32,
    pub contrast_percent: f32,
    pub saturation_percent: f32,
    pub size: SizePreset,
    pub format: OutputFormat,
    /// Only used for lossy formats.
    pub quality: f32,
    pub use_device_pixel_ratio: bool,
    pub device_pixel_ratio: f32,
    /// File name without extension.
    pub base_name: String,
}

impl ExportSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            blend_mode: config.composite.blend_mode,
            opacity_percent: config.composite.opacity,
            brightness_percent: config.tone.brightness,
            contrast_percent: config.tone.contrast,
            saturation_percent: config.tone.saturation,
            size: config.output.size,
            format: config.output.format,
            quality: config.output.quality,
            use_device_pixel_ratio: config.output.use_device_pixel_ratio,
            device_pixel_ratio: config.output.device_pixel_ratio,
            base_name: config.output.filename.clone(),
        }
    }

    pub fn tone(&self) -> ToneParameters {
        ToneParameters::from_percent(
            self.brightness_percent,
            self.contrast_percent,
            self.saturation_percent,
        )
    }

    pub fn opacity(&self) -> Opacity {
        Opacity::from_percent(self.opacity_percent)
    }

    pub fn pixel_ratio(&self) -> f32 {
        if self.use_device_pixel_ratio {
            self.device_pixel_ratio
        } else {
            1.0
        }
    }

    /// Resolve these settings against a photo's size.
    pub fn plan(&self, source: (u32, u32)) -> Result<ExportPlan, BackendError> {
        plan_export(
            source,
            &PlanRequest {
                size: self.size,
                pixel_ratio: self.pixel_ratio(),
                format: self.format,
                quality: Some(Quality::new(self.quality)),
                base_name: &self.base_name,
            },
        )
    }
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

/// Observer handle. Dropped receivers are ignored.
struct Progress<'a>(Option<&'a Sender<ExportEvent>>);

impl Progress<'_> {
    fn stage(&self, stage: ExportStage) {
        debug!(%stage, "export stage");
        if let Some(tx) = self.0 {
            let _ = tx.send(ExportEvent::Progress {
                stage,
                fraction: stage.progress(),
                label: stage.label(),
            });
        }
    }

    fn failed(&self, err: &ExportError) {
        warn!(stage = %err.stage(), error = %err, "export failed");
        if let Some(tx) = self.0 {
            let _ = tx.send(ExportEvent::Failed {
                stage: err.stage(),
                reason: err.to_string(),
            });
        }
    }
}

/// Log a failure and send it to the observer, for failures raised before
/// the pipeline starts.
pub(crate) fn report_failure(observer: Option<&Sender<ExportEvent>>, err: &ExportError) {
    Progress(observer).failed(err);
}

fn render(
    backend: &impl ImageBackend,
    photo: &Bitmap,
    texture: &Bitmap,
    settings: &ExportSettings,
    progress: &Progress<'_>,
) -> Result<(EncodedImage, ExportPlan), ExportError> {
    progress.stage(ExportStage::Compositing);
    let plan = settings
        .plan(photo.dimensions())
        .map_err(imaging(ExportStage::Compositing))?;
    let composite = plan.composite_params(settings.blend_mode, settings.opacity());
    let surface = backend
        .composite(photo, texture, &composite)
        .map_err(imaging(ExportStage::Compositing))?;

    progress.stage(ExportStage::ApplyingFilters);
    let surface = backend
        .apply_tone(&surface, &settings.tone())
        .map_err(imaging(ExportStage::ApplyingFilters))?;

    progress.stage(ExportStage::Encoding);
    let encoded = backend
        .encode(&surface, &plan.encode_params())
        .map_err(imaging(ExportStage::Encoding))?;

    Ok((encoded, plan))
}

/// Composite, tone and encode already-decoded bitmaps.
///
/// Synchronous and CPU-bound. Reports the stages it runs through to
/// `observer`, and a [`ExportEvent::Failed`] if one of them fails.
pub fn run_pipeline(
    backend: &impl ImageBackend,
    photo: &Bitmap,
    texture: &Bitmap,
    settings: &ExportSettings,
    observer: Option<&Sender<ExportEvent>>,
) -> PipelineResult {
    let progress = Progress(observer);
    render(backend, photo, texture, settings, &progress)
        .map(|(encoded, _)| encoded)
        .inspect_err(|e| progress.failed(e))
}

/// Render a live preview through the same compositor and tone pass as export.
///
/// The longer edge is capped at `max_edge` and the pixel ratio is always 1.
/// For the same settings the tone stage produces the same pixels as export.
pub fn render_preview(
    backend: &impl ImageBackend,
    photo: &Bitmap,
    texture: &Bitmap,
    settings: &ExportSettings,
    max_edge: u32,
) -> Result<Surface, ExportError> {
    let (width, height) = fit_longer_edge(photo.width(), photo.height(), Some(max_edge.max(1)));
    let params = CompositeParams {
        width,
        height,
        pixel_ratio: 1.0,
        blend_mode: settings.blend_mode,
        opacity: settings.opacity(),
    };
    let surface = backend
        .composite(photo, texture, &params)
        .map_err(imaging(ExportStage::Compositing))?;
    backend
        .apply_tone(&surface, &settings.tone())
        .map_err(imaging(ExportStage::ApplyingFilters))
}

/// A finished, delivered export.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportOutcome {
    pub path: PathBuf,
    pub plan: ExportPlan,
    pub mime_type: &'static str,
    pub bytes: usize,
}

/// Run one complete export: load the texture, render, deliver.
///
/// There is no retry; a failed export has to be started again by the caller.
#[tracing::instrument(skip_all, fields(texture = %texture, format = %settings.format))]
pub async fn export(
    backend: &impl ImageBackend,
    loader: &Loader,
    sink: &dyn DeliverySink,
    photo: &Bitmap,
    texture: &str,
    settings: &ExportSettings,
    observer: Option<&Sender<ExportEvent>>,
) -> Result<ExportOutcome, ExportError> {
    let progress = Progress(observer);
    let result = async {
        progress.stage(ExportStage::Decoding);
        let texture = loader
            .load_bitmap(ImageSource::Texture(texture.to_string()))
            .await
            .map_err(|source| ExportError::Load {
                stage: ExportStage::Decoding,
                source,
            })?;

        let (encoded, plan) = render(backend, photo, &texture, settings, &progress)?;

        progress.stage(ExportStage::Delivering);
        let path = sink.deliver(&encoded)?;

        progress.stage(ExportStage::Done);
        Ok::<_, ExportError>(ExportOutcome {
            path,
            plan,
            mime_type: encoded.mime_type,
            bytes: encoded.bytes.len(),
        })
    }
    .await;

    match &result {
        Ok(outcome) => info!(
            path = %outcome.path.display(),
            bytes = outcome.bytes,
            sink = sink.name(),
            "export complete"
        ),
        Err(e) => progress.failed(e),
    }
    result
}
