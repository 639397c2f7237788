//! # Mesh Radio
//!
//! Low-latency live audio broadcast over a multi-hop wireless mesh.
//!
//! One transmitter publishes its microphone to a named mesh group; any
//! number of nearby listeners subscribed to the same group play it back
//! continuously. There is no central server, no pairing, and no delivery
//! guarantee — packets may arrive late, out of order, duplicated, or not
//! at all, and the receive side reconstructs continuous audio anyway.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────── TRANSMITTER ────────────────────────┐
//! │  ┌────────────┐    ┌────────────┐    ┌──────────────────┐   │
//! │  │ Microphone │───▶│ FrameCodec │───▶│ MeshChannel      │   │
//! │  │ (capture   │    │ (f32 LE    │    │ .publish()       │   │
//! │  │  thread)   │    │  packets)  │    │ (non-blocking)   │   │
//! │  └────────────┘    └────────────┘    └────────┬─────────┘   │
//! └────────────────────────────────────────────────┼────────────┘
//!                                                  │ multi-hop mesh
//!                         best-effort, unordered   │ (group pub/sub)
//!                                                  ▼
//! ┌───────────────────────── RECEIVER ──────────────────────────┐
//! │  ┌──────────────────┐    ┌────────────┐    ┌─────────────┐  │
//! │  │ MeshChannel      │───▶│ FrameCodec │───▶│ Playback    │  │
//! │  │ .subscribe()     │    │ (drop      │    │ Buffer      │  │
//! │  │ (delivery thread)│    │  malformed)│    │ (jitter)    │  │
//! │  └──────────────────┘    └────────────┘    └──────┬──────┘  │
//! │                                                   ▼         │
//! │                                            ┌─────────────┐  │
//! │                                            │ Speaker     │  │
//! │                                            │ (output     │  │
//! │                                            │  thread)    │  │
//! │                                            └─────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The playback buffer queues frames in arrival order (the wire carries no
//! sequence numbers), evicts the oldest frame when full so latency stays
//! bounded, and repeats the last played frame on underrun so playback
//! never drops out.

pub mod audio;
pub mod codec;
pub mod config;
pub mod error;
pub mod mesh;
pub mod stream;

pub use error::{Error, Result};

/// Application-wide constants
pub mod constants {
    /// Fixed sample rate for every frame in the pipeline
    pub const SAMPLE_RATE: u32 = 44_100;

    /// Samples per mono transport frame
    pub const FRAME_SAMPLES: usize = 1024;

    /// Serialized size of one frame in bytes (f32 samples)
    pub const FRAME_BYTES: usize = FRAME_SAMPLES * 4;

    /// Jitter budget of the playback buffer, in frames
    pub const JITTER_FRAMES: usize = 6;

    /// Depth of the mesh transport send queue, in packets
    pub const SEND_QUEUE_DEPTH: usize = 64;
}
