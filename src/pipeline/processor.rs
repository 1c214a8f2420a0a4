use tower::{Service, ServiceExt};
use tracing::{debug, error};

use crate::capture::CaptureSink;
use crate::common::FrameLease;
use crate::detector::CaptureEvent;
use crate::error::AppError;
use crate::pipeline::counter::BoxedCounterService;
use crate::pipeline::session::{CaptureSession, ProcessorStats};

/// Runs each leased frame through the object counter and into the capture session.
pub struct FrameProcessor<S> {
    counter: BoxedCounterService,
    session: CaptureSession<S>,
}

impl<S: CaptureSink> FrameProcessor<S> {
    pub fn new(counter: BoxedCounterService, session: CaptureSession<S>) -> Self {
        Self { counter, session }
    }

    /// Count the objects in the leased frame, give the frame back to its source, then
    /// decide whether to capture.
    ///
    /// A frame the detector could not count is skipped: nothing is pushed for it.
    pub async fn process(&mut self, lease: FrameLease) -> Result<Option<CaptureEvent>, AppError> {
        let frame_id = lease.frame().frame_id();
        let counted = match self.counter.ready().await {
            Ok(counter) => counter.call(lease.frame().clone()).await,
            Err(e) => Err(e),
        };
        lease.release();

        let count = match counted {
            Ok(count) => count,
            Err(e) => {
                error!("Detection failed for frame {}: {}", frame_id, e);
                self.session.record_skipped();
                return Ok(None);
            }
        };
        debug!("Frame {} has {} objects", frame_id, count);
        self.session.record_processed();

        let count = i64::try_from(count).unwrap_or(i64::MAX);
        self.session.observe(count).await
    }

    pub fn stats(&self) -> ProcessorStats {
        self.session.stats()
    }

    pub fn session(&self) -> &CaptureSession<S> {
        &self.session
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::ChannelCaptureSink;
    use crate::common::Frame;
    use crate::config::DetectorConfig;
    use crate::detector::DetectorState;
    use crate::pipeline::counter::{CounterService, ObjectCounter};
    use async_trait::async_trait;
    use chrono::Utc;
    use image::{DynamicImage, ImageBuffer, Rgb};
    use std::collections::VecDeque;
    use std::sync::atomic::Ordering;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// Replays a script of counts; `None` entries fail like a detector error.
    struct ScriptedCounter {
        script: Mutex<VecDeque<Option<usize>>>,
    }

    impl ScriptedCounter {
        fn new(script: Vec<Option<usize>>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into()),
            })
        }
    }

    #[async_trait]
    impl ObjectCounter for ScriptedCounter {
        async fn count(&self, _frame: &Frame) -> Result<usize, AppError> {
            let next = self.script.lock().unwrap().pop_front().flatten();
            next.ok_or_else(|| AppError::Detection("model unavailable".to_string()))
        }

        fn name(&self) -> &'static str {
            "ScriptedCounter"
        }
    }

    struct HangingCounter;

    #[async_trait]
    impl ObjectCounter for HangingCounter {
        async fn count(&self, _frame: &Frame) -> Result<usize, AppError> {
            futures::future::pending::<()>().await;
            Ok(0)
        }

        fn name(&self) -> &'static str {
            "HangingCounter"
        }
    }

    fn test_frame() -> Frame {
        Frame::new(
            DynamicImage::ImageRgb8(ImageBuffer::<Rgb<u8>, Vec<u8>>::from_pixel(
                8,
                8,
                Rgb([9, 9, 9]),
            )),
            Utc::now(),
            90,
        )
    }

    fn processor(
        counter: Arc<dyn ObjectCounter>,
        timeout: Option<Duration>,
    ) -> (
        FrameProcessor<ChannelCaptureSink>,
        tokio::sync::mpsc::Receiver<CaptureEvent>,
    ) {
        let (sink, capture_rx) = ChannelCaptureSink::new(8);
        let session = CaptureSession::new(DetectorConfig::new(3, 2), sink).unwrap();
        let counter = CounterService::builder(counter)
            .detection_timeout(timeout)
            .build();
        (FrameProcessor::new(counter, session), capture_rx)
    }

    #[tokio::test]
    async fn counted_frames_drive_the_detector() {
        let counter = ScriptedCounter::new(vec![Some(1), Some(1), Some(1), Some(4), Some(4), Some(4)]);
        let (mut processor, mut capture_rx) = processor(counter, None);

        let mut events = Vec::new();
        for _ in 0..6 {
            let (lease, released) = FrameLease::tracked(test_frame());
            events.push(processor.process(lease).await.unwrap());
            assert!(released.load(Ordering::SeqCst));
        }

        assert_eq!(events.iter().filter(|e| e.is_some()).count(), 1);
        assert_eq!(events[5], Some(CaptureEvent));
        assert_eq!(capture_rx.try_recv().unwrap(), CaptureEvent);
        assert_eq!(processor.stats().frames_processed, 6);
    }

    #[tokio::test]
    async fn failed_detection_is_skipped_and_released() {
        let counter = ScriptedCounter::new(vec![Some(2), None, Some(2)]);
        let (mut processor, _capture_rx) = processor(counter, None);

        for _ in 0..3 {
            let (lease, released) = FrameLease::tracked(test_frame());
            assert!(processor.process(lease).await.unwrap().is_none());
            assert!(released.load(Ordering::SeqCst));
        }

        assert_eq!(processor.session().detector().window().snapshot(), vec![2, 2]);
        assert_eq!(processor.stats().frames_skipped, 1);
        assert_eq!(processor.stats().frames_processed, 2);
        assert_eq!(processor.session().state(), DetectorState::Idle);
    }

    #[tokio::test]
    async fn timed_out_detection_is_skipped_and_released() {
        let (mut processor, _capture_rx) =
            processor(Arc::new(HangingCounter), Some(Duration::from_millis(20)));

        let (lease, released) = FrameLease::tracked(test_frame());
        assert!(processor.process(lease).await.unwrap().is_none());
        assert!(released.load(Ordering::SeqCst));
        assert_eq!(processor.stats().frames_skipped, 1);
        assert!(processor.session().detector().window().is_empty());
    }
}
