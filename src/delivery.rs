//! Delivery sinks: where a finished export goes.
//!
//! The export path only ever sees a [`DeliverySink`]. Which sink that is gets
//! decided once, when the session starts, by [`select_sink`]:
//!
//! - [`DownloadSink`] writes the bytes into the output directory.
//! - [`ShareSink`] writes the file the same way, then hands its path to an
//!   external program (`xdg-open` by default). If that program cannot be
//!   started or exits non-zero, the saved file stands as a download.

use crate::config::{DeliveryConfig, DeliveryMode};
use crate::imaging::EncodedImage;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Share via '{program}' failed: {reason}")]
    ShareFailed { program: String, reason: String },
}

/// Receives one encoded image and returns where it ended up.
pub trait DeliverySink: Send + Sync {
    fn name(&self) -> &'static str;

    fn deliver(&self, image: &EncodedImage) -> Result<PathBuf, DeliveryError>;
}

/// Saves exports into a directory.
#[derive(Debug, Clone)]
pub struct DownloadSink {
    dir: PathBuf,
}

impl DownloadSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl DeliverySink for DownloadSink {
    fn name(&self) -> &'static str {
        "download"
    }

    fn deliver(&self, image: &EncodedImage) -> Result<PathBuf, DeliveryError> {
        let path = write_file(&self.dir, image)?;
        info!(path = %path.display(), mime = image.mime_type, "saved export");
        Ok(path)
    }
}

/// Saves the export, then opens it with an external program.
#[derive(Debug, Clone)]
pub struct ShareSink {
    program: String,
    dir: PathBuf,
}

impl ShareSink {
    pub fn new(program: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            dir: dir.into(),
        }
    }
}

impl DeliverySink for ShareSink {
    fn name(&self) -> &'static str {
        "share"
    }

    fn deliver(&self, image: &EncodedImage) -> Result<PathBuf, DeliveryError> {
        let path = write_file(&self.dir, image)?;
        match self.open(&path) {
            Ok(()) => info!(path = %path.display(), program = %self.program, "shared export"),
            Err(e) => warn!(path = %path.display(), error = %e, "share failed, keeping download"),
        }
        Ok(path)
    }
}

impl ShareSink {
    fn open(&self, path: &Path) -> Result<(), DeliveryError> {
        let failed = |reason: String| DeliveryError::ShareFailed {
            program: self.program.clone(),
            reason,
        };
        let status = Command::new(&self.program)
            .arg(path)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|e| failed(e.to_string()))?;
        if !status.success() {
            return Err(failed(format!("exited with {status}")));
        }
        Ok(())
    }
}

fn write_file(dir: &Path, image: &EncodedImage) -> Result<PathBuf, DeliveryError> {
    let path = dir.join(&image.filename);
    let io_err = |source| DeliveryError::Io {
        path: path.clone(),
        source,
    };
    std::fs::create_dir_all(dir).map_err(io_err)?;
    std::fs::write(&path, &image.bytes).map_err(io_err)?;
    Ok(path)
}

/// Whether `program` can be launched: an existing path, or a name found on `PATH`.
pub fn program_available(program: &str) -> bool {
    let candidate = Path::new(program);
    if candidate.components().count() > 1 {
        return candidate.is_file();
    }
    std::env::var_os("PATH")
        .map(|paths| std::env::split_paths(&paths).any(|dir| dir.join(program).is_file()))
        .unwrap_or(false)
}

/// Pick the sink for this session.
///
/// `auto` shares when the share command is available and downloads otherwise.
pub fn select_sink(config: &DeliveryConfig) -> Box<dyn DeliverySink> {
    let share = match config.mode {
        DeliveryMode::Download => false,
        DeliveryMode::Share => true,
        DeliveryMode::Auto => program_available(&config.share_command),
    };
    debug!(mode = ?config.mode, share, "selected delivery sink");
    if share {
        Box::new(ShareSink::new(&config.share_command, &config.output_dir))
    } else {
        Box::new(DownloadSink::new(&config.output_dir))
    }
}
