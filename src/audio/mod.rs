//! Audio subsystem module

pub mod buffer;
pub mod capture;
pub mod device;
pub mod frame;
pub mod playback;

pub use buffer::{PlaybackBuffer, PlaybackStats};
pub use capture::{FrameSource, MicCapture};
pub use frame::AudioFrame;
pub use playback::{OutputSink, SpeakerSink};
