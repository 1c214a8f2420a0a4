pub mod stability;
pub mod state;
pub mod window;

pub use stability::{StabilityDetector, transition};
pub use state::{CaptureEvent, DetectorState};
pub use window::{Observation, ObservationWindow};

use crate::config::DetectorConfig;
use crate::error::DetectorError;

/// Watches per-frame object counts and emits one [`CaptureEvent`] each time hands
/// move through the frame and the scene settles again.
///
/// Owns the observation window and the state machine together; both start empty/idle
/// and are dropped together when analysis stops.
#[derive(Debug, Clone)]
pub struct HandsDetector {
    window: ObservationWindow,
    stability: StabilityDetector,
}

impl HandsDetector {
    pub fn new(config: DetectorConfig) -> Result<Self, DetectorError> {
        config.validate()?;
        Ok(Self {
            window: ObservationWindow::new(config.window_size)?,
            stability: StabilityDetector::new(config.variability_threshold),
        })
    }

    /// Feed the object count of the next processed frame.
    ///
    /// Invalid counts are rejected before anything is touched, so the window and
    /// state are exactly as they were before the call.
    pub fn observe(&mut self, count: i64) -> Result<Option<CaptureEvent>, DetectorError> {
        self.window.push(count)?;
        Ok(self.stability.evaluate(&self.window))
    }

    pub fn state(&self) -> DetectorState {
        self.stability.state()
    }

    pub fn window(&self) -> &ObservationWindow {
        &self.window
    }

    pub fn reset(&mut self) {
        self.window.clear();
        self.stability.reset();
    }
}
