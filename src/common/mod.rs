pub mod frame;
pub mod lease;

pub use frame::Frame;
pub use lease::FrameLease;
