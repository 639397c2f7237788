//! Receive pipeline

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::audio::buffer::{PlaybackBuffer, PlaybackStats};
use crate::audio::playback::{OutputSink, SpeakerSink};
use crate::codec::FrameCodec;
use crate::config::StreamConfig;
use crate::error::Result;
use crate::mesh::MeshChannel;
use crate::stream::{StateCell, StreamState};

/// Listening controller: mesh → codec → jitter buffer → speaker.
///
/// Construction wires the subscription and starts the sink; the receiver
/// then listens for its lifetime. State flips to `Receiving` on the
/// first decoded frame and stays there — the wire carries no
/// end-of-stream signal, so a stopped transmitter is indistinguishable
/// from a slow one.
pub struct Receiver {
    buffer: Arc<PlaybackBuffer>,
    sink: Box<dyn OutputSink>,
    state: Arc<StateCell>,
    malformed: Arc<AtomicU64>,
    channel: Arc<MeshChannel>,
}

impl Receiver {
    /// Receiver playing through the default output device.
    pub fn new(config: StreamConfig, channel: Arc<MeshChannel>) -> Result<Self> {
        Self::with_sink(Box::new(SpeakerSink::new(config.clone())), config, channel)
    }

    /// Receiver with a caller-provided output sink.
    pub fn with_sink(
        mut sink: Box<dyn OutputSink>,
        config: StreamConfig,
        channel: Arc<MeshChannel>,
    ) -> Result<Self> {
        let buffer = Arc::new(PlaybackBuffer::new(config.jitter_frames));
        let state = Arc::new(StateCell::new(StreamState::Idle));
        let malformed = Arc::new(AtomicU64::new(0));

        let codec = FrameCodec::new(config.frame_samples);
        let handler_buffer = buffer.clone();
        let handler_state = state.clone();
        let handler_malformed = malformed.clone();
        channel.subscribe(move |packet| match codec.decode(&packet) {
            Ok(frame) => {
                handler_state.store(StreamState::Receiving);
                handler_buffer.enqueue(frame);
            }
            Err(e) => {
                // Malformed packets cost themselves, nothing else.
                handler_malformed.fetch_add(1, Ordering::Relaxed);
                tracing::debug!("dropping packet: {}", e);
            }
        });

        sink.start(buffer.clone())?;
        tracing::info!(group = %channel.group(), "listening");

        Ok(Self {
            buffer,
            sink,
            state,
            malformed,
            channel,
        })
    }

    /// Group this receiver is tuned to
    pub fn group(&self) -> &crate::mesh::MeshGroup {
        self.channel.group()
    }

    /// Published lifecycle state
    pub fn state(&self) -> StreamState {
        self.state.load()
    }

    /// Jitter buffer counters
    pub fn playback_stats(&self) -> PlaybackStats {
        self.buffer.stats()
    }

    /// Packets dropped for not being an exact frame
    pub fn malformed_packets(&self) -> u64 {
        self.malformed.load(Ordering::Relaxed)
    }
}

impl Drop for Receiver {
    fn drop(&mut self) {
        self.sink.stop();
    }
}
