use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::info;

use crate::detector::CaptureEvent;
use crate::error::AppError;

/// Receives the "take the picture now" signal.
///
/// The sink owns the actual capture and reports its own success or failure; the
/// detector does not care about the outcome.
#[async_trait]
pub trait CaptureSink: Send + Sync {
    async fn on_capture(&self, event: CaptureEvent) -> Result<(), AppError>;
    fn name(&self) -> &'static str;
}

#[async_trait]
impl<T: CaptureSink + ?Sized> CaptureSink for Arc<T> {
    async fn on_capture(&self, event: CaptureEvent) -> Result<(), AppError> {
        (**self).on_capture(event).await
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

#[async_trait]
impl<T: CaptureSink + ?Sized> CaptureSink for Box<T> {
    async fn on_capture(&self, event: CaptureEvent) -> Result<(), AppError> {
        (**self).on_capture(event).await
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

/// Forwards capture events to whoever holds the receiving end.
#[derive(Debug, Clone)]
pub struct ChannelCaptureSink {
    capture_tx: mpsc::Sender<CaptureEvent>,
}

impl ChannelCaptureSink {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<CaptureEvent>) {
        let (capture_tx, capture_rx) = mpsc::channel(capacity);
        (Self { capture_tx }, capture_rx)
    }
}

#[async_trait]
impl CaptureSink for ChannelCaptureSink {
    async fn on_capture(&self, event: CaptureEvent) -> Result<(), AppError> {
        self.capture_tx
            .send(event)
            .await
            .map_err(|e| AppError::Capture(format!("capture receiver dropped: {}", e)))
    }

    fn name(&self) -> &'static str {
        "ChannelCaptureSink"
    }
}

/// Only logs; useful for dry runs over recorded count traces.
#[derive(Debug, Clone, Default)]
pub struct LoggingCaptureSink;

#[async_trait]
impl CaptureSink for LoggingCaptureSink {
    async fn on_capture(&self, _event: CaptureEvent) -> Result<(), AppError> {
        info!("Capture requested");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "LoggingCaptureSink"
    }
}
