pub mod capture;
pub mod common;
pub mod config;
pub mod coordinator;
pub mod detector;
pub mod error;
pub mod pipeline;

pub use crate::error::{AppError, DetectorError};

pub use crate::capture::{
    CaptureSink, ChannelCaptureSink, LoggingCaptureSink, PhotoCaptureSink, StillCamera,
};
pub use crate::common::{Frame, FrameLease};
pub use crate::config::{Configuration, DetectorConfig};
pub use crate::coordinator::{Coordinator, CoordinatorBuilder, FrameFeed, OfferOutcome};
pub use crate::detector::{CaptureEvent, DetectorState, HandsDetector};
pub use crate::pipeline::{CaptureSession, ObjectCounter, ProcessorStats};
