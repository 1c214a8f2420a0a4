use serde::Serialize;
use tracing::{debug, error};

use crate::capture::CaptureSink;
use crate::config::DetectorConfig;
use crate::detector::{CaptureEvent, DetectorState, HandsDetector};
use crate::error::AppError;

/// Counters for one analysis session.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProcessorStats {
    pub frames_processed: u64,
    pub frames_skipped: u64,
    pub observations: u64,
    pub rejected_observations: u64,
    pub captures_fired: u64,
    pub capture_failures: u64,
}

/// The hands detector wired to the collaborator that takes the picture.
pub struct CaptureSession<S> {
    detector: HandsDetector,
    sink: S,
    stats: ProcessorStats,
}

impl<S: CaptureSink> CaptureSession<S> {
    pub fn new(config: DetectorConfig, sink: S) -> Result<Self, AppError> {
        Ok(Self {
            detector: HandsDetector::new(config)?,
            sink,
            stats: ProcessorStats::default(),
        })
    }

    /// Feed one object count. A rejected count is surfaced to the caller and leaves the
    /// detector untouched; a failing sink is logged and counted but does not.
    pub async fn observe(&mut self, count: i64) -> Result<Option<CaptureEvent>, AppError> {
        let event = match self.detector.observe(count) {
            Ok(event) => event,
            Err(e) => {
                self.stats.rejected_observations += 1;
                return Err(e.into());
            }
        };
        self.stats.observations += 1;

        if let Some(event) = event {
            self.stats.captures_fired += 1;
            debug!("Dispatching capture to {}", self.sink.name());
            if let Err(e) = self.sink.on_capture(event).await {
                self.stats.capture_failures += 1;
                error!("{} failed to capture: {}", self.sink.name(), e);
            }
        }
        Ok(event)
    }

    pub(crate) fn record_processed(&mut self) {
        self.stats.frames_processed += 1;
    }

    pub(crate) fn record_skipped(&mut self) {
        self.stats.frames_skipped += 1;
    }

    pub fn state(&self) -> DetectorState {
        self.detector.state()
    }

    pub fn detector(&self) -> &HandsDetector {
        &self.detector
    }

    pub fn stats(&self) -> ProcessorStats {
        self.stats
    }
}
