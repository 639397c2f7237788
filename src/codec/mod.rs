//! Frame codec
//!
//! Serializes a frame to its transport form: the frame's samples as
//! little-endian f32 words, nothing else. No header, no sequence number,
//! no timestamp — a transport packet is exactly `frame_samples * 4`
//! bytes, and anything else is malformed.

use bytes::{BufMut, Bytes, BytesMut};

use crate::audio::frame::AudioFrame;
use crate::error::CodecError;

/// Pure, stateless byte reinterpretation between [`AudioFrame`] and its
/// transport packet. Byte order is little-endian.
#[derive(Debug, Clone)]
pub struct FrameCodec {
    frame_samples: usize,
}

impl FrameCodec {
    pub fn new(frame_samples: usize) -> Self {
        Self { frame_samples }
    }

    /// Serialized packet size in bytes
    pub fn packet_bytes(&self) -> usize {
        self.frame_samples * std::mem::size_of::<f32>()
    }

    /// Serialize a frame to a packet of exactly
    /// [`packet_bytes`](Self::packet_bytes) bytes.
    pub fn encode(&self, frame: &AudioFrame) -> Bytes {
        debug_assert_eq!(frame.len(), self.frame_samples);

        let mut buf = BytesMut::with_capacity(self.packet_bytes());
        for sample in &frame.samples {
            buf.put_f32_le(*sample);
        }
        buf.freeze()
    }

    /// Deserialize a transport packet.
    ///
    /// Fails with [`CodecError::MalformedFrame`] unless the payload is
    /// exactly one frame; the caller drops such packets.
    pub fn decode(&self, packet: &[u8]) -> Result<AudioFrame, CodecError> {
        let expected = self.packet_bytes();
        if packet.len() != expected {
            return Err(CodecError::MalformedFrame {
                expected,
                actual: packet.len(),
            });
        }

        let mut samples = Vec::with_capacity(self.frame_samples);
        for chunk in packet.chunks_exact(4) {
            samples.push(f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]));
        }
        Ok(AudioFrame::new(samples))
    }
}
