//! Mesh transport abstraction
//!
//! The transport is a process-wide handle with an explicit powered-on
//! lifecycle, injected into channels rather than reached for as a
//! singleton. It offers group-scoped publish/subscribe with at-most-effort
//! multi-hop delivery: no ordering, no acknowledgment, possible
//! duplication. Readiness is signaled out-of-band through
//! [`MeshTransport::on_ready`].

use bytes::Bytes;

use crate::error::MeshError;
use crate::mesh::group::MeshGroup;

/// Handler invoked once per packet observed for a subscribed group, on
/// the transport's delivery thread. Must not block.
pub type PacketHandler = Box<dyn Fn(Bytes) + Send + Sync>;

/// Readiness notification callback
pub type ReadyCallback = Box<dyn FnOnce() + Send>;

/// Group-scoped publish/subscribe over a multi-hop mesh.
pub trait MeshTransport: Send + Sync {
    /// Whether the transport is powered on and moving traffic.
    fn is_ready(&self) -> bool;

    /// Invoke `callback` once the transport becomes ready; immediately if
    /// it already is.
    fn on_ready(&self, callback: ReadyCallback);

    /// Best-effort, non-blocking enqueue of a packet for propagation to
    /// current group members. Fails with [`MeshError::TransportNotReady`]
    /// before power-on; a full send queue drops the packet silently
    /// rather than blocking the caller.
    fn publish(&self, group: &MeshGroup, packet: Bytes) -> Result<(), MeshError>;

    /// Register `handler` for every packet observed on `group`. Before
    /// power-on the registration is deferred and completed on readiness;
    /// packets observed before then are never delivered. Handlers stay
    /// registered for the transport's lifetime.
    fn subscribe(&self, group: &MeshGroup, handler: PacketHandler);
}
