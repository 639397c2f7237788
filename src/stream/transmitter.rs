//! Transmit pipeline

use std::sync::Arc;

use crate::audio::capture::{FrameSource, MicCapture};
use crate::codec::FrameCodec;
use crate::config::StreamConfig;
use crate::error::{MeshError, Result};
use crate::mesh::MeshChannel;
use crate::stream::{StateCell, StreamState};

/// Live broadcast controller: microphone → codec → mesh.
///
/// Owns its frame source outright; the channel is shared by reference
/// with other controllers on the same group.
pub struct Transmitter {
    source: Box<dyn FrameSource>,
    codec: FrameCodec,
    channel: Arc<MeshChannel>,
    state: Arc<StateCell>,
}

impl Transmitter {
    /// Transmitter over the default microphone.
    pub fn new(config: StreamConfig, channel: Arc<MeshChannel>) -> Self {
        Self::with_source(Box::new(MicCapture::new(config.clone())), config, channel)
    }

    /// Transmitter over a caller-provided frame source.
    pub fn with_source(
        source: Box<dyn FrameSource>,
        config: StreamConfig,
        channel: Arc<MeshChannel>,
    ) -> Self {
        Self {
            source,
            codec: FrameCodec::new(config.frame_samples),
            channel,
            state: Arc::new(StateCell::new(StreamState::Idle)),
        }
    }

    /// Begin broadcasting. Fails with `DeviceUnavailable` when no
    /// microphone is present and `TransportNotReady` before the mesh is
    /// powered on. Starting while already transmitting is a no-op.
    pub fn start(&mut self) -> Result<()> {
        if self.state.load() == StreamState::Transmitting {
            return Ok(());
        }
        if !self.channel.is_ready() {
            return Err(MeshError::TransportNotReady.into());
        }

        let codec = self.codec.clone();
        let channel = self.channel.clone();
        self.source.start(Box::new(move |frame| {
            // Failures stay on the capture thread: a saturated or
            // powered-down transport costs the frame, never the stream.
            let _ = channel.publish(codec.encode(&frame));
        }))?;

        self.state.store(StreamState::Transmitting);
        tracing::info!(group = %self.channel.group(), "transmitting");
        Ok(())
    }

    /// Stop broadcasting. The capture thread is joined before return, so
    /// no frame callback runs afterwards. Idempotent.
    pub fn stop(&mut self) {
        self.source.stop();
        if self.state.load() != StreamState::Idle {
            self.state.store(StreamState::Idle);
            tracing::info!(group = %self.channel.group(), "transmit stopped");
        }
    }

    /// Published lifecycle state
    pub fn state(&self) -> StreamState {
        self.state.load()
    }
}

impl Drop for Transmitter {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::frame::AudioFrame;
    use crate::mesh::{LinkProfile, LoopbackMesh, MeshGroup};
    use crate::stream::testing::ScriptedSource;
    use bytes::Bytes;
    use parking_lot::Mutex;
    use std::thread;
    use std::time::{Duration, Instant};

    fn test_config() -> StreamConfig {
        StreamConfig {
            sample_rate: 44_100,
            frame_samples: 1024,
            jitter_frames: 6,
        }
    }

    fn frames(count: usize) -> Vec<AudioFrame> {
        (0..count)
            .map(|i| AudioFrame::new(vec![i as f32 / 100.0; 1024]))
            .collect()
    }

    fn wait_for_published(channel: &MeshChannel, count: u64) {
        let deadline = Instant::now() + Duration::from_secs(2);
        while channel.published() < count && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn test_start_requires_ready_transport() {
        let mesh = Arc::new(LoopbackMesh::new(LinkProfile::transparent(), 16).unwrap());
        let channel = Arc::new(MeshChannel::new(mesh, MeshGroup::from_name("test")));

        let mut transmitter = Transmitter::with_source(
            Box::new(ScriptedSource::new(frames(1))),
            test_config(),
            channel,
        );

        let err = transmitter.start().unwrap_err();
        assert!(matches!(
            err,
            crate::Error::Mesh(MeshError::TransportNotReady)
        ));
        assert_eq!(transmitter.state(), StreamState::Idle);
    }

    #[test]
    fn test_double_stop_is_noop() {
        let mesh = Arc::new(LoopbackMesh::new(LinkProfile::transparent(), 16).unwrap());
        mesh.power_on();
        let channel = Arc::new(MeshChannel::new(mesh, MeshGroup::from_name("test")));

        let mut transmitter = Transmitter::with_source(
            Box::new(ScriptedSource::new(frames(3))),
            test_config(),
            channel,
        );

        // Stop before ever starting is also a no-op
        transmitter.stop();
        assert_eq!(transmitter.state(), StreamState::Idle);

        transmitter.start().unwrap();
        assert_eq!(transmitter.state(), StreamState::Transmitting);

        transmitter.stop();
        assert_eq!(transmitter.state(), StreamState::Idle);
        transmitter.stop();
        assert_eq!(transmitter.state(), StreamState::Idle);
    }

    #[test]
    fn test_publishes_one_packet_per_frame() {
        let mesh = Arc::new(LoopbackMesh::new(LinkProfile::transparent(), 64).unwrap());
        mesh.power_on();

        let group = MeshGroup::from_name("test");
        let sizes = Arc::new(Mutex::new(Vec::new()));
        let sizes_in_handler = sizes.clone();
        let rx_channel = MeshChannel::new(mesh.clone(), group.clone());
        rx_channel.subscribe(move |packet: Bytes| {
            sizes_in_handler.lock().push(packet.len());
        });

        let channel = Arc::new(MeshChannel::new(mesh.clone(), group));
        let mut transmitter = Transmitter::with_source(
            Box::new(ScriptedSource::new(frames(10))),
            test_config(),
            channel.clone(),
        );

        transmitter.start().unwrap();
        wait_for_published(&channel, 10);
        transmitter.stop();
        mesh.flush();

        assert_eq!(channel.published(), 10);
        let sizes = sizes.lock();
        assert_eq!(sizes.len(), 10);
        assert!(sizes.iter().all(|&len| len == 1024 * 4));
    }

    #[test]
    fn test_stop_during_capture_halts_callbacks() {
        let mesh = Arc::new(LoopbackMesh::new(LinkProfile::transparent(), 64).unwrap());
        mesh.power_on();
        let channel = Arc::new(MeshChannel::new(mesh, MeshGroup::from_name("test")));

        let mut transmitter = Transmitter::with_source(
            Box::new(ScriptedSource::new(frames(100_000))),
            test_config(),
            channel.clone(),
        );

        transmitter.start().unwrap();
        thread::sleep(Duration::from_millis(5));

        // Stop races the emitting thread; after it returns the pipeline
        // must be silent.
        transmitter.stop();
        let published_at_stop = channel.published();

        thread::sleep(Duration::from_millis(20));
        assert_eq!(channel.published(), published_at_stop);
        assert_eq!(transmitter.state(), StreamState::Idle);
    }

    #[test]
    fn test_start_twice_is_noop() {
        let mesh = Arc::new(LoopbackMesh::new(LinkProfile::transparent(), 64).unwrap());
        mesh.power_on();
        let channel = Arc::new(MeshChannel::new(mesh, MeshGroup::from_name("test")));

        let mut transmitter = Transmitter::with_source(
            Box::new(ScriptedSource::new(frames(5))),
            test_config(),
            channel,
        );

        transmitter.start().unwrap();
        assert_eq!(transmitter.state(), StreamState::Transmitting);
        transmitter.start().unwrap();
        assert_eq!(transmitter.state(), StreamState::Transmitting);
        transmitter.stop();
    }
}
