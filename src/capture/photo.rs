use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Local};
use image::{DynamicImage, ImageFormat};
use tracing::{error, info};

use crate::capture::sink::CaptureSink;
use crate::config::Configuration;
use crate::detector::CaptureEvent;
use crate::error::AppError;

/// The still-capture side of the camera.
#[async_trait]
pub trait StillCamera: Send + Sync {
    async fn take_picture(&self) -> Result<DynamicImage, AppError>;
}

/// Takes a full picture on every capture event and stores it as
/// `<capture_dir>/yyyyMMddHHmmss.jpg`.
pub struct PhotoCaptureSink<C> {
    camera: C,
    capture_dir: PathBuf,
}

impl<C: StillCamera> PhotoCaptureSink<C> {
    pub fn new(camera: C, capture_dir: impl Into<PathBuf>) -> Self {
        Self {
            camera,
            capture_dir: capture_dir.into(),
        }
    }

    /// Writes into the configured `capture_dir`.
    pub fn from_configuration(camera: C, configuration: &Configuration) -> Self {
        Self::new(camera, configuration.capture_dir.clone())
    }

    pub fn capture_dir(&self) -> &Path {
        &self.capture_dir
    }

    /// Take a picture and write it out, returning where it landed.
    pub async fn take_photo(&self) -> Result<PathBuf, AppError> {
        let picture = self.camera.take_picture().await?;
        tokio::fs::create_dir_all(&self.capture_dir).await?;
        let path = next_free_path(&self.capture_dir, &file_stem_for(Local::now())).await?;

        let target = path.clone();
        tokio::task::spawn_blocking(move || {
            // JPEG has no alpha channel
            DynamicImage::ImageRgb8(picture.to_rgb8()).save_with_format(&target, ImageFormat::Jpeg)
        })
        .await
        .map_err(|e| AppError::Capture(format!("photo writer task failed: {}", e)))??;

        Ok(path)
    }
}

pub fn file_stem_for(now: DateTime<Local>) -> String {
    now.format("%Y%m%d%H%M%S").to_string()
}

/// Two captures within one second share a timestamp; suffix `_1`, `_2`, ... to keep both.
pub async fn next_free_path(dir: &Path, stem: &str) -> Result<PathBuf, AppError> {
    let mut candidate = dir.join(format!("{}.jpg", stem));
    let mut suffix = 1;
    while tokio::fs::try_exists(&candidate).await? {
        candidate = dir.join(format!("{}_{}.jpg", stem, suffix));
        suffix += 1;
    }
    Ok(candidate)
}

#[async_trait]
impl<C: StillCamera> CaptureSink for PhotoCaptureSink<C> {
    async fn on_capture(&self, _event: CaptureEvent) -> Result<(), AppError> {
        match self.take_photo().await {
            Ok(path) => {
                info!("Photo capture succeeded: {}", path.display());
                Ok(())
            }
            Err(e) => {
                error!("The photo did not save due to {}", e);
                Err(e)
            }
        }
    }

    fn name(&self) -> &'static str {
        "PhotoCaptureSink"
    }
}
