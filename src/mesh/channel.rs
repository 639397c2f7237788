//! Publish/subscribe channel for one mesh group

use bytes::Bytes;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::error::MeshError;
use crate::mesh::group::MeshGroup;
use crate::mesh::transport::{MeshTransport, PacketHandler};

/// One logical group on one transport.
///
/// A channel carries a single publisher or a single subscriber
/// registration per controller; the transport handle behind it is the
/// only state shared across controllers of the same group.
pub struct MeshChannel {
    transport: Arc<dyn MeshTransport>,
    group: MeshGroup,
    published: AtomicU64,
}

impl MeshChannel {
    pub fn new(transport: Arc<dyn MeshTransport>, group: MeshGroup) -> Self {
        Self {
            transport,
            group,
            published: AtomicU64::new(0),
        }
    }

    pub fn group(&self) -> &MeshGroup {
        &self.group
    }

    /// Whether the transport behind this channel is powered on
    pub fn is_ready(&self) -> bool {
        self.transport.is_ready()
    }

    /// Best-effort publish of one packet to the group. Non-blocking; a
    /// full transport queue costs the packet, not the caller. Fails only
    /// while the transport is not powered on.
    pub fn publish(&self, packet: Bytes) -> Result<(), MeshError> {
        self.transport.publish(&self.group, packet)?;
        self.published.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Register `handler` for every packet observed on the group.
    /// Deferred silently until the transport is ready; stays registered
    /// for the channel's lifetime.
    pub fn subscribe(&self, handler: impl Fn(Bytes) + Send + Sync + 'static) {
        let boxed: PacketHandler = Box::new(handler);
        self.transport.subscribe(&self.group, boxed);
    }

    /// Packets handed to the transport since construction
    pub fn published(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::loopback::{LinkProfile, LoopbackMesh};
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_publish_counts_only_when_ready() {
        let mesh = Arc::new(LoopbackMesh::new(LinkProfile::transparent(), 16).unwrap());
        let channel = MeshChannel::new(mesh.clone(), MeshGroup::from_name("test"));

        assert!(channel.publish(Bytes::from_static(b"a")).is_err());
        assert_eq!(channel.published(), 0);

        mesh.power_on();
        channel.publish(Bytes::from_static(b"a")).unwrap();
        assert_eq!(channel.published(), 1);
    }

    #[test]
    fn test_subscribe_receives_published_packets() {
        let mesh = Arc::new(LoopbackMesh::new(LinkProfile::transparent(), 16).unwrap());
        mesh.power_on();

        let group = MeshGroup::from_name("test");
        let tx_channel = MeshChannel::new(mesh.clone(), group.clone());
        let rx_channel = MeshChannel::new(mesh.clone(), group);

        let count = Arc::new(AtomicUsize::new(0));
        let count_in_handler = count.clone();
        rx_channel.subscribe(move |_| {
            count_in_handler.fetch_add(1, Ordering::SeqCst);
        });

        for _ in 0..5 {
            tx_channel.publish(Bytes::from_static(b"a")).unwrap();
        }
        mesh.flush();

        assert_eq!(count.load(Ordering::SeqCst), 5);
    }
}
