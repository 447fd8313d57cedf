//! Image Source Loader.
//!
//! Turns either uploaded bytes or a named texture into a [`Bitmap`]. Reading
//! happens through `tokio::fs` and decoding runs on the blocking pool, so the
//! caller only ever awaits one future per image.
//!
//! Textures come from a fixed set of file names resolved against the
//! configured textures directory. Decoded textures are cached by canonical
//! name for the life of the loader; uploads are never cached.

use crate::imaging::{BackendError, Bitmap, decode_bitmap};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;
use tracing::{debug, info};

/// The bundled textures, in menu order.
pub const TEXTURES: &[&str] = &[
    "magazine.jpg",
    "vinyl-bleed.jpg",
    "60s-mustard.jpg",
    "royal-navy.jpg",
    "tonor.png",
    "heavy-grain.png",
];

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Unknown texture '{0}'")]
    UnknownTexture(String),
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Decode(#[from] BackendError),
    #[error("Decode task failed: {0}")]
    Task(String),
}

/// Map a texture identifier to its canonical file name.
///
/// Accepts the file name itself or its stem (`"tonor"` → `"tonor.png"`),
/// case-insensitively.
pub fn resolve_texture(name: &str) -> Option<&'static str> {
    let wanted = name.trim().to_ascii_lowercase();
    TEXTURES.iter().copied().find(|file| {
        *file == wanted || crate::naming::texture_label(file) == wanted
    })
}

/// Where a bitmap comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// Raw bytes of an uploaded image in any format the decoder understands.
    Bytes(Vec<u8>),
    /// A texture identifier, resolved with [`resolve_texture`].
    Texture(String),
}

pub struct Loader {
    textures_dir: PathBuf,
    cache: Mutex<HashMap<&'static str, Arc<Bitmap>>>,
}

impl Loader {
    pub fn new(textures_dir: impl Into<PathBuf>) -> Self {
        Self {
            textures_dir: textures_dir.into(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn textures_dir(&self) -> &Path {
        &self.textures_dir
    }

    /// Load and decode one image.
    ///
    /// Fails without a partial result: zero-byte or corrupt input is
    /// [`LoaderError::Decode`]. A decode task that panicked, or a texture
    /// cache poisoned by one, is [`LoaderError::Task`].
    pub async fn load_bitmap(&self, source: ImageSource) -> Result<Arc<Bitmap>, LoaderError> {
        match source {
            ImageSource::Bytes(bytes) => decode_off_thread(bytes).await.map(Arc::new),
            ImageSource::Texture(name) => self.load_texture(&name).await,
        }
    }

    /// Read a photo from disk and decode it.
    pub async fn load_path(&self, path: &Path) -> Result<Arc<Bitmap>, LoaderError> {
        let bytes = read(path).await?;
        debug!(path = %path.display(), bytes = bytes.len(), "read photo");
        self.load_bitmap(ImageSource::Bytes(bytes)).await
    }

    async fn load_texture(&self, name: &str) -> Result<Arc<Bitmap>, LoaderError> {
        let file = resolve_texture(name).ok_or_else(|| LoaderError::UnknownTexture(name.into()))?;

        if let Some(hit) = self.lock_cache()?.get(file).cloned() {
            debug!(texture = file, "texture cache hit");
            return Ok(hit);
        }

        let path = self.textures_dir.join(file);
        let bytes = read(&path).await?;
        let bitmap = Arc::new(decode_off_thread(bytes).await?);
        info!(
            texture = file,
            width = bitmap.width(),
            height = bitmap.height(),
            "loaded texture"
        );

        self.lock_cache()?.insert(file, Arc::clone(&bitmap));
        Ok(bitmap)
    }

    fn lock_cache(&self) -> Result<MutexGuard<'_, HashMap<&'static str, Arc<Bitmap>>>, LoaderError> {
        self.cache
            .lock()
            .map_err(|_| LoaderError::Task("texture cache poisoned".into()))
    }

    /// Number of textures decoded so far.
    pub fn cached_textures(&self) -> usize {
        self.lock_cache().map_or(0, |c| c.len())
    }
}

async fn read(path: &Path) -> Result<Vec<u8>, LoaderError> {
    tokio::fs::read(path).await.map_err(|source| LoaderError::Io {
        path: path.to_path_buf(),
        source,
    })
}

async fn decode_off_thread(bytes: Vec<u8>) -> Result<Bitmap, LoaderError> {
    let bitmap = tokio::task::spawn_blocking(move || decode_bitmap(&bytes))
        .await
        .map_err(|e| LoaderError::Task(e.to_string()))??;
    Ok(bitmap)
}
