use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use async_trait::async_trait;
use tower::timeout::TimeoutLayer;
use tower::util::BoxService;
use tower::{BoxError, Service, ServiceBuilder};

use crate::common::Frame;
use crate::error::AppError;

/// Boundary to the external object-detection model.
#[async_trait]
pub trait ObjectCounter: Send + Sync {
    /// Number of objects the model sees in `frame`.
    async fn count(&self, frame: &Frame) -> Result<usize, AppError>;
    fn name(&self) -> &'static str;
}

pub type BoxedCounterService = BoxService<Frame, usize, BoxError>;

#[derive(Clone)]
pub struct CounterService {
    inner: Arc<dyn ObjectCounter>,
}

impl CounterService {
    pub fn new(inner: Arc<dyn ObjectCounter>) -> Self {
        Self { inner }
    }

    pub fn builder(inner: Arc<dyn ObjectCounter>) -> CounterServiceBuilder {
        CounterServiceBuilder {
            counter: inner,
            detection_timeout: None,
        }
    }
}

impl Service<Frame> for CounterService {
    type Response = usize;
    type Error = BoxError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, frame: Frame) -> Self::Future {
        let inner = self.inner.clone();
        Box::pin(async move { Ok(inner.count(&frame).await?) })
    }
}

pub struct CounterServiceBuilder {
    counter: Arc<dyn ObjectCounter>,
    detection_timeout: Option<Duration>,
}

impl CounterServiceBuilder {
    pub fn detection_timeout(mut self, detection_timeout: Option<Duration>) -> Self {
        self.detection_timeout = detection_timeout;
        self
    }

    pub fn build(self) -> BoxedCounterService {
        let service = ServiceBuilder::new()
            .option_layer(self.detection_timeout.map(TimeoutLayer::new))
            .service(CounterService::new(self.counter));
        BoxService::new(service)
    }
}
