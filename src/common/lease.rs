use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::debug;

use crate::common::frame::Frame;

type ReleaseFn = Box<dyn FnOnce() + Send + 'static>;

/// A frame borrowed from the camera pipeline.
///
/// The source needs its buffer back no matter how analysis of the frame ends, so the
/// release callback runs exactly once: on an explicit [`FrameLease::release`] or when
/// the lease is dropped.
pub struct FrameLease {
    frame: Frame,
    release: Option<ReleaseFn>,
}

impl FrameLease {
    pub fn new(frame: Frame, release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            frame,
            release: Some(Box::new(release)),
        }
    }

    /// A lease whose source does not need to be told when the frame is done.
    pub fn unmanaged(frame: Frame) -> Self {
        Self {
            frame,
            release: None,
        }
    }

    /// A lease paired with a flag that flips once the frame has been released.
    pub fn tracked(frame: Frame) -> (Self, Arc<AtomicBool>) {
        let released = Arc::new(AtomicBool::new(false));
        let flag = released.clone();
        let lease = Self::new(frame, move || flag.store(true, Ordering::SeqCst));
        (lease, released)
    }

    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    pub fn release(mut self) {
        self.release_now();
    }

    fn release_now(&mut self) {
        if let Some(release) = self.release.take() {
            debug!("Releasing frame {}", self.frame.frame_id());
            release();
        }
    }
}

impl Drop for FrameLease {
    fn drop(&mut self) {
        self.release_now();
    }
}

impl std::fmt::Debug for FrameLease {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameLease")
            .field("frame", &self.frame)
            .field("released", &self.release.is_none())
            .finish()
    }
}
