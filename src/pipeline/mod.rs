pub mod counter;
pub mod processor;
pub mod session;

pub use counter::{BoxedCounterService, CounterService, ObjectCounter};
pub use processor::FrameProcessor;
pub use session::{CaptureSession, ProcessorStats};
