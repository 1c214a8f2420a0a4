use serde::Serialize;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum DetectorState {
    /// Scene is settled, or not enough history has arrived yet.
    #[default]
    Idle,
    /// The object count is swinging; something is moving through the frame.
    HandsPresent,
}

/// Signal that the scene has settled and a still should be taken now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureEvent;
