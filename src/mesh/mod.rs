//! Mesh transport subsystem

pub mod channel;
pub mod group;
pub mod loopback;
pub mod transport;

pub use channel::MeshChannel;
pub use group::MeshGroup;
pub use loopback::{LinkProfile, LoopbackMesh, MeshStats};
pub use transport::{MeshTransport, PacketHandler};
