//! Stream controllers
//!
//! [`Transmitter`] wires capture → codec → mesh publish; [`Receiver`]
//! wires mesh subscribe → codec → playback buffer → output sink. Both
//! publish a [`StreamState`] the presentation layer can poll.

pub mod receiver;
pub mod transmitter;

pub use receiver::Receiver;
pub use transmitter::Transmitter;

use std::sync::atomic::{AtomicU8, Ordering};

/// Controller lifecycle state, readable from any thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Idle = 0,
    Transmitting = 1,
    Receiving = 2,
}

/// Lock-free cell behind the published state.
pub(crate) struct StateCell(AtomicU8);

impl StateCell {
    pub(crate) fn new(state: StreamState) -> Self {
        Self(AtomicU8::new(state as u8))
    }

    pub(crate) fn store(&self, state: StreamState) {
        self.0.store(state as u8, Ordering::SeqCst);
    }

    pub(crate) fn load(&self) -> StreamState {
        match self.0.load(Ordering::SeqCst) {
            1 => StreamState::Transmitting,
            2 => StreamState::Receiving,
            _ => StreamState::Idle,
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::thread::JoinHandle;
    use std::time::Duration;

    use crate::audio::buffer::PlaybackBuffer;
    use crate::audio::capture::{FrameCallback, FrameSource};
    use crate::audio::frame::AudioFrame;
    use crate::audio::playback::OutputSink;
    use crate::error::AudioError;

    /// Emits a fixed script of frames from its own thread.
    pub(crate) struct ScriptedSource {
        frames: Vec<AudioFrame>,
        running: Arc<AtomicBool>,
        handle: Option<JoinHandle<()>>,
    }

    impl ScriptedSource {
        pub(crate) fn new(frames: Vec<AudioFrame>) -> Self {
            Self {
                frames,
                running: Arc::new(AtomicBool::new(false)),
                handle: None,
            }
        }
    }

    impl FrameSource for ScriptedSource {
        fn start(&mut self, mut on_frame: FrameCallback) -> Result<(), AudioError> {
            if self.running.load(Ordering::SeqCst) {
                return Ok(());
            }
            let frames = self.frames.clone();
            let running = self.running.clone();
            running.store(true, Ordering::SeqCst);

            self.handle = Some(std::thread::spawn(move || {
                for frame in frames {
                    if !running.load(Ordering::SeqCst) {
                        break;
                    }
                    on_frame(frame);
                    std::thread::sleep(Duration::from_micros(200));
                }
            }));
            Ok(())
        }

        fn stop(&mut self) {
            self.running.store(false, Ordering::SeqCst);
            if let Some(handle) = self.handle.take() {
                let _ = handle.join();
            }
        }
    }

    #[derive(Default)]
    pub(crate) struct SinkFlags {
        pub(crate) started: AtomicBool,
        pub(crate) stopped: AtomicBool,
    }

    /// Sink that records lifecycle calls and drains nothing.
    pub(crate) struct NullSink {
        flags: Arc<SinkFlags>,
    }

    impl NullSink {
        pub(crate) fn new() -> Self {
            Self {
                flags: Arc::new(SinkFlags::default()),
            }
        }

        pub(crate) fn flags(&self) -> Arc<SinkFlags> {
            self.flags.clone()
        }
    }

    impl OutputSink for NullSink {
        fn start(&mut self, _buffer: Arc<PlaybackBuffer>) -> Result<(), AudioError> {
            self.flags.started.store(true, Ordering::SeqCst);
            Ok(())
        }

        fn stop(&mut self) {
            self.flags.stopped.store(true, Ordering::SeqCst);
        }
    }
}
