//! Error types for the mesh radio core

use thiserror::Error;

/// Main error type for the crate
#[derive(Error, Debug)]
pub enum Error {
    #[error("Audio error: {0}")]
    Audio(#[from] AudioError),

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("Mesh error: {0}")]
    Mesh(#[from] MeshError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Audio subsystem errors
#[derive(Error, Debug)]
pub enum AudioError {
    /// No capture/output device is present, or access was denied.
    #[error("Device unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("Failed to open stream: {0}")]
    StreamFailed(String),
}

/// Frame codec errors
#[derive(Error, Debug)]
pub enum CodecError {
    /// Payload is not exactly one serialized frame. The packet must be
    /// dropped, never partially reconstructed.
    #[error("Malformed frame: expected {expected} bytes, got {actual}")]
    MalformedFrame { expected: usize, actual: usize },
}

/// Mesh transport errors
#[derive(Error, Debug)]
pub enum MeshError {
    #[error("Mesh transport is not powered on")]
    TransportNotReady,

    #[error("Mesh transport failure: {0}")]
    TransportFailed(String),
}

/// Result type alias for the crate
pub type Result<T> = std::result::Result<T, Error>;
