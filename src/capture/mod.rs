pub mod photo;
pub mod sink;

pub use photo::{PhotoCaptureSink, StillCamera};
pub use sink::{CaptureSink, ChannelCaptureSink, LoggingCaptureSink};
