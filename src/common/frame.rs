use chrono::{DateTime, Utc};
use image::DynamicImage;
use std::sync::Arc;
use uuid::Uuid;

/// One preview frame handed to the object detector.
#[derive(Clone)]
pub struct Frame {
    frame_id: Uuid,
    image: Arc<DynamicImage>,
    captured_at: DateTime<Utc>,
    rotation_degrees: u16,
}

impl Frame {
    pub fn new(image: DynamicImage, captured_at: DateTime<Utc>, rotation_degrees: u16) -> Self {
        Self {
            frame_id: Uuid::new_v4(),
            image: Arc::new(image),
            captured_at,
            rotation_degrees: rotation_degrees % 360,
        }
    }

    pub fn frame_id(&self) -> Uuid {
        self.frame_id
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    /// Clockwise rotation the detector should apply to see the frame upright.
    pub fn rotation_degrees(&self) -> u16 {
        self.rotation_degrees
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("frame_id", &self.frame_id)
            .field("width", &self.image.width())
            .field("height", &self.image.height())
            .field("captured_at", &self.captured_at)
            .field("rotation_degrees", &self.rotation_degrees)
            .finish()
    }
}
