use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::Level;

use crate::error::{AppError, DetectorError};

pub const DEFAULT_WINDOW_SIZE: usize = 15;
pub const DEFAULT_VARIABILITY_THRESHOLD: u32 = 2;

/// Tuning for the hands detector.
///
/// A larger `window_size` resists single-frame noise but delays the capture; a larger
/// `variability_threshold` needs a bigger swing in the object count before the
/// detector decides hands are in frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub window_size: usize,
    pub variability_threshold: u32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            variability_threshold: DEFAULT_VARIABILITY_THRESHOLD,
        }
    }
}

impl DetectorConfig {
    pub fn new(window_size: usize, variability_threshold: u32) -> Self {
        Self {
            window_size,
            variability_threshold,
        }
    }

    pub fn validate(&self) -> Result<(), DetectorError> {
        if self.window_size == 0 {
            return Err(DetectorError::InvalidConfig(
                "Window size must be greater than 0".to_string(),
            ));
        }

        if self.variability_threshold == 0 {
            return Err(DetectorError::InvalidConfig(
                "Variability threshold must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Configuration {
    pub detector: DetectorConfig,
    pub frame_buffer_size: usize,
    pub detection_timeout_ms: Option<u64>,
    pub capture_dir: PathBuf,
    pub log_level: String,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            detector: DetectorConfig::default(),
            frame_buffer_size: 4,
            detection_timeout_ms: None,
            capture_dir: PathBuf::from("captures"),
            log_level: "info".to_string(),
        }
    }
}

impl Configuration {
    /// Loads the configuration from an optional TOML file, then lets `STOPMOTION_*`
    /// environment variables override it (`STOPMOTION_DETECTOR__WINDOW_SIZE=20`).
    pub fn load(path: Option<&Path>) -> Result<Self, AppError> {
        Self::load_with_env_prefix(path, "STOPMOTION")
    }

    fn load_with_env_prefix(path: Option<&Path>, env_prefix: &str) -> Result<Self, AppError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(false));
        }
        let configuration: Configuration = builder
            .add_source(
                config::Environment::with_prefix(env_prefix)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        configuration.validate()?;
        Ok(configuration)
    }

    // Sets the window size, this will override the loaded configuration.
    pub fn window_size(mut self, window_size: usize) -> Self {
        self.detector.window_size = window_size;
        self
    }

    // Sets the variability threshold, this will override the loaded configuration.
    pub fn variability_threshold(mut self, threshold: u32) -> Self {
        self.detector.variability_threshold = threshold;
        self
    }

    // Adjusts the frame buffer size, this will override the loaded configuration.
    pub fn frame_buffer_size(mut self, frame_buffer_size: usize) -> Self {
        self.frame_buffer_size = frame_buffer_size;
        self
    }

    pub fn detection_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.detection_timeout_ms = Some(timeout_ms);
        self
    }

    pub fn capture_dir(mut self, capture_dir: impl Into<PathBuf>) -> Self {
        self.capture_dir = capture_dir.into();
        self
    }

    pub fn validate(&self) -> Result<(), AppError> {
        self.detector.validate()?;

        if self.frame_buffer_size == 0 {
            return Err(AppError::Pipeline(
                "Frame buffer size must be greater than 0".to_string(),
            ));
        }

        if self.detection_timeout_ms == Some(0) {
            return Err(AppError::Pipeline(
                "Detection timeout must be greater than 0".to_string(),
            ));
        }

        self.max_log_level()?;
        Ok(())
    }

    pub fn detection_timeout(&self) -> Option<Duration> {
        self.detection_timeout_ms.map(Duration::from_millis)
    }

    pub fn max_log_level(&self) -> Result<Level, AppError> {
        self.log_level
            .parse::<Level>()
            .map_err(|_| AppError::Pipeline(format!("Unknown log level '{}'", self.log_level)))
    }
}
