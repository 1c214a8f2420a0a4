use thiserror::Error;

// Main Application Error Type

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Detector Error: {0}")]
    Detector(#[from] DetectorError),
    #[error("Configuration Error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Object detection failed: {0}")]
    Detection(String),
    #[error("Capture failed: {0}")]
    Capture(String),
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image Error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Pipeline Error: {0}")]
    Pipeline(String),
}

// Detector Error Type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DetectorError {
    #[error("Invalid observation {0}: object counts must be between 0 and u32::MAX")]
    InvalidObservation(i64),
    #[error("The observation window is empty.")]
    EmptyWindow,
    #[error("Invalid detector configuration: {0}")]
    InvalidConfig(String),
}
