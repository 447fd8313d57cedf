//! The editing session.
//!
//! Holds what the user has picked so far: the photo, the texture, and the
//! delivery sink chosen when the session started. Settings are not stored
//! here; every preview or export call receives its own [`ExportSettings`].

use crate::config::AppConfig;
use crate::delivery::{DeliverySink, select_sink};
use crate::export::{self, ExportError, ExportEvent, ExportOutcome, ExportSettings, ExportStage};
use crate::imaging::{Bitmap, ImageBackend, RustBackend, Surface};
use crate::loader::{ImageSource, Loader, LoaderError, resolve_texture};
use std::path::Path;
use std::sync::Arc;
use std::sync::mpsc::Sender;
use tracing::info;

pub struct Session<B: ImageBackend = RustBackend> {
    backend: B,
    loader: Loader,
    sink: Box<dyn DeliverySink>,
    photo: Option<Arc<Bitmap>>,
    texture: &'static str,
}

impl Session<RustBackend> {
    /// Start a session from configuration, checking the share command once.
    pub fn from_config(config: &AppConfig) -> Self {
        Self::with_parts(
            RustBackend::new(),
            Loader::new(&config.assets.textures_dir),
            select_sink(&config.delivery),
        )
    }
}

impl<B: ImageBackend> Session<B> {
    /// Assemble a session from explicit parts (allows testing with mocks).
    pub fn with_parts(backend: B, loader: Loader, sink: Box<dyn DeliverySink>) -> Self {
        info!(sink = sink.name(), textures = %loader.textures_dir().display(), "session started");
        Self {
            backend,
            loader,
            sink,
            photo: None,
            texture: crate::loader::TEXTURES[0],
        }
    }

    pub fn sink_name(&self) -> &'static str {
        self.sink.name()
    }

    pub fn texture(&self) -> &'static str {
        self.texture
    }

    pub fn photo(&self) -> Option<&Bitmap> {
        self.photo.as_deref()
    }

    /// Replace the photo with an uploaded image.
    pub async fn load_photo_bytes(&mut self, bytes: Vec<u8>) -> Result<(), LoaderError> {
        let bitmap = self.loader.load_bitmap(ImageSource::Bytes(bytes)).await?;
        self.set_photo(bitmap);
        Ok(())
    }

    pub async fn load_photo_path(&mut self, path: &Path) -> Result<(), LoaderError> {
        let bitmap = self.loader.load_path(path).await?;
        self.set_photo(bitmap);
        Ok(())
    }

    fn set_photo(&mut self, bitmap: Arc<Bitmap>) {
        info!(width = bitmap.width(), height = bitmap.height(), "photo loaded");
        self.photo = Some(bitmap);
    }

    /// Select a texture and decode it right away, so the next preview or
    /// export does not wait on it. The previous selection is kept on failure.
    pub async fn select_texture(&mut self, name: &str) -> Result<(), LoaderError> {
        let file = resolve_texture(name).ok_or_else(|| LoaderError::UnknownTexture(name.into()))?;
        self.loader.load_bitmap(ImageSource::Texture(file.into())).await?;
        self.texture = file;
        Ok(())
    }

    fn require_photo(&self) -> Result<&Bitmap, ExportError> {
        self.photo.as_deref().ok_or(ExportError::NoPhoto)
    }

    /// Render the live preview, longer edge capped at `max_edge`.
    pub async fn preview(&self, settings: &ExportSettings, max_edge: u32) -> Result<Surface, ExportError> {
        let photo = self.require_photo()?;
        let texture = self
            .loader
            .load_bitmap(ImageSource::Texture(self.texture.into()))
            .await
            .map_err(|source| ExportError::Load {
                stage: ExportStage::Decoding,
                source,
            })?;
        export::render_preview(&self.backend, photo, &texture, settings, max_edge)
    }

    /// Export with the session's photo, texture and sink.
    pub async fn export(
        &self,
        settings: &ExportSettings,
        observer: Option<&Sender<ExportEvent>>,
    ) -> Result<ExportOutcome, ExportError> {
        let photo = match self.require_photo() {
            Ok(photo) => photo,
            Err(e) => {
                export::report_failure(observer, &e);
                return Err(e);
            }
        };
        export::export(
            &self.backend,
            &self.loader,
            self.sink.as_ref(),
            photo,
            self.texture,
            settings,
            observer,
        )
        .await
    }
}
