use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::mpsc::{self, Receiver, error::TrySendError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::{
    capture::CaptureSink,
    common::FrameLease,
    config::Configuration,
    error::AppError,
    pipeline::{CaptureSession, CounterService, FrameProcessor, ObjectCounter, ProcessorStats},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OfferOutcome {
    Accepted,
    /// The pipeline is behind; the frame was released without being analysed.
    Dropped,
    Closed,
}

/// Producer side of the frame intake. Cheap to clone; hand one to the camera callback.
#[derive(Debug, Clone)]
pub struct FrameFeed {
    frame_tx: mpsc::Sender<FrameLease>,
    dropped: Arc<AtomicU64>,
}

impl FrameFeed {
    /// Offer a frame without waiting. When the pipeline is still busy with earlier
    /// frames this one is dropped, which releases it back to the source.
    pub fn offer(&self, lease: FrameLease) -> OfferOutcome {
        match self.frame_tx.try_send(lease) {
            Ok(()) => OfferOutcome::Accepted,
            Err(TrySendError::Full(lease)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                debug!("Pipeline busy, dropping frame {}", lease.frame().frame_id());
                OfferOutcome::Dropped
            }
            Err(TrySendError::Closed(_lease)) => {
                warn!("Frame offered after the pipeline stopped");
                OfferOutcome::Closed
            }
        }
    }

    /// Wait for room instead of dropping. Used when replaying recorded frames.
    pub async fn send(&self, lease: FrameLease) -> Result<(), AppError> {
        self.frame_tx
            .send(lease)
            .await
            .map_err(|_| AppError::Pipeline("Frame pipeline is closed".to_string()))
    }

    pub fn dropped_frames(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Owns the analysis task for one capture session.
pub struct Coordinator {
    pipeline_task: Option<JoinHandle<ProcessorStats>>,
    cancel_token: CancellationToken,
    feed: FrameFeed,
}

impl Coordinator {
    fn new<S: CaptureSink + 'static>(
        configuration: &Configuration,
        processor: FrameProcessor<S>,
    ) -> Self {
        let cancel_token = CancellationToken::new();
        let (frame_tx, frame_rx) = mpsc::channel(configuration.frame_buffer_size);
        let pipeline_task = Self::start_pipeline_task(processor, frame_rx, cancel_token.clone());

        Self {
            pipeline_task: Some(pipeline_task),
            cancel_token,
            feed: FrameFeed {
                frame_tx,
                dropped: Arc::new(AtomicU64::new(0)),
            },
        }
    }

    fn start_pipeline_task<S: CaptureSink + 'static>(
        mut processor: FrameProcessor<S>,
        mut frame_rx: Receiver<FrameLease>,
        cancel_token: CancellationToken,
    ) -> JoinHandle<ProcessorStats> {
        tokio::spawn(async move {
            info!("Frame analysis started");
            loop {
                tokio::select! {
                    biased;
                    _ = cancel_token.cancelled() => {
                        debug!("Frame analysis cancelled");
                        break;
                    }
                    lease = frame_rx.recv() => {
                        let Some(lease) = lease else {
                            debug!("Frame feed closed");
                            break;
                        };
                        // A stuck detector must not hold up shutdown; dropping the
                        // in-flight future releases its frame.
                        tokio::select! {
                            biased;
                            _ = cancel_token.cancelled() => {
                                debug!("Frame analysis cancelled mid-frame");
                                break;
                            }
                            result = processor.process(lease) => match result {
                                Ok(Some(_)) => info!("Scene settled, capture fired"),
                                Ok(None) => {}
                                Err(e) => error!("Pipeline error: {}", e),
                            }
                        }
                    }
                }
            }
            // Frames still queued are released when the receiver drops.
            frame_rx.close();
            let stats = processor.stats();
            info!("Frame analysis stopped: {:?}", stats);
            stats
        })
    }

    pub fn feed(&self) -> FrameFeed {
        self.feed.clone()
    }

    /// Stop analysis and wait for the pipeline task to finish. The detector state is
    /// discarded with the task.
    pub async fn stop(mut self) -> Result<ProcessorStats, AppError> {
        self.cancel_token.cancel();
        match self.pipeline_task.take() {
            Some(task) => task
                .await
                .map_err(|e| AppError::Pipeline(format!("Pipeline task failed: {}", e))),
            None => Err(AppError::Pipeline("Pipeline already stopped".to_string())),
        }
    }

    /// Let queued frames drain, then stop.
    pub async fn finish(mut self) -> Result<ProcessorStats, AppError> {
        let Some(task) = self.pipeline_task.take() else {
            return Err(AppError::Pipeline("Pipeline already stopped".to_string()));
        };
        // Replace our sender with a closed one so the task sees the end of the feed once
        // every other clone is gone.
        let (closed_tx, _) = mpsc::channel(1);
        self.feed.frame_tx = closed_tx;
        task.await
            .map_err(|e| AppError::Pipeline(format!("Pipeline task failed: {}", e)))
    }
}

impl Drop for Coordinator {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}

pub struct CoordinatorBuilder {
    configuration: Configuration,
    counter: Option<Arc<dyn ObjectCounter>>,
    sink: Option<Box<dyn CaptureSink>>,
    detection_timeout: Option<Duration>,
}

impl CoordinatorBuilder {
    pub fn new(configuration: Configuration) -> Self {
        Self {
            configuration,
            counter: None,
            sink: None,
            detection_timeout: None,
        }
    }

    // Sets the window size, this will override the default configuration.
    pub fn window_size(mut self, window_size: usize) -> Self {
        self.configuration.detector.window_size = window_size;
        self
    }

    // Sets the variability threshold, this will override the default configuration.
    pub fn variability_threshold(mut self, threshold: u32) -> Self {
        self.configuration.detector.variability_threshold = threshold;
        self
    }

    // Adjusts the frame buffer size, this will override the default configuration.
    pub fn frame_buffer_size(mut self, frame_buffer_size: usize) -> Self {
        self.configuration.frame_buffer_size = frame_buffer_size;
        self
    }

    // Sets the detection timeout, this will override the default configuration.
    pub fn detection_timeout(mut self, timeout: Duration) -> Self {
        self.detection_timeout = Some(timeout);
        self
    }

    pub fn counter(mut self, counter: Arc<dyn ObjectCounter>) -> Self {
        self.counter = Some(counter);
        self
    }

    pub fn sink(mut self, sink: impl CaptureSink + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    /// Must be called from within a tokio runtime.
    pub fn build(self) -> Result<Coordinator, AppError> {
        self.configuration.validate()?;
        if self.detection_timeout == Some(Duration::ZERO) {
            return Err(AppError::Pipeline(
                "Detection timeout must be greater than 0".to_string(),
            ));
        }
        let detection_timeout = self
            .detection_timeout
            .or_else(|| self.configuration.detection_timeout());
        let counter = self
            .counter
            .ok_or(AppError::Pipeline("Object counter not set".to_string()))?;
        let sink = self
            .sink
            .ok_or(AppError::Pipeline("Capture sink not set".to_string()))?;

        info!(
            "Starting capture session: window={}, threshold={}, counter={}, sink={}",
            self.configuration.detector.window_size,
            self.configuration.detector.variability_threshold,
            counter.name(),
            sink.name()
        );

        let counter = CounterService::builder(counter)
            .detection_timeout(detection_timeout)
            .build();
        let session = CaptureSession::new(self.configuration.detector, sink)?;
        Ok(Coordinator::new(
            &self.configuration,
            FrameProcessor::new(counter, session),
        ))
    }
}
